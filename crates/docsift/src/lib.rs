pub mod classify;
pub mod config;
pub mod convert;
pub mod driver;
pub mod error;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod schema;
pub mod worker;

pub use config::{load_config, Config};
pub use driver::{process_folder, run_batch, watch_folder, BatchSummary};
pub use error::{ConfigError, ConvertError, DocsiftError, OutputError, Result, WorkerError};
pub use pipeline::{Outcome, Pipeline, PipelineConfig, PipelineContext};
pub use schema::{DocKind, DocumentRecord};
pub use worker::{FileRef, FileStatus, InFlightRegistry};
