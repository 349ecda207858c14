use thiserror::Error;

use crate::error::{ConvertError, OutputError};

/// Failures that end a single document's run. These never propagate past
/// the worker; each becomes a `SkippedError` outcome for that document.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Could not write output record: {0}")]
    Output(#[from] OutputError),

    #[error("Final record serialized to an empty object")]
    EmptyPayload,
}
