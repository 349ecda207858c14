pub mod config;
pub mod context;
pub mod error;
pub mod runner;
pub mod temp;

pub use config::PipelineConfig;
pub use context::PipelineContext;
pub use error::PipelineError;
pub use runner::{Outcome, Pipeline};
pub use temp::{BatchTempDir, TempArtifact};
