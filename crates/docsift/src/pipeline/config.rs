use std::path::PathBuf;

/// Resolved settings the per-document pipeline needs. Built once per batch
/// or watch session from the application [`Config`](crate::config::Config).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    /// Scratch area for normalized PDF intermediates.
    pub temp_dir: PathBuf,
    /// Character cap on text sent with the classification prompt.
    pub max_classify_chars: usize,
}
