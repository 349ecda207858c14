use std::path::PathBuf;

use crate::pipeline::temp::TempArtifact;
use crate::schema::DocumentRecord;

/// Mutable state threaded through one document's pipeline run.
pub struct PipelineContext {
    // Input
    pub source_path: PathBuf,

    // Step 1 result — guaranteed Some after step_normalize. Owning the
    // artifact here ties intermediate cleanup to the context's lifetime.
    pub intermediate: Option<TempArtifact>,

    // Step 2 results
    pub page_count: usize,
    pub multi_page: bool,

    // Step 3 result — guaranteed Some after step_extract
    pub primary_text: Option<String>,

    // Step 4/5 result — guaranteed Some after step_classify
    pub record: Option<DocumentRecord>,

    // Step 6 result
    pub output_path: Option<PathBuf>,
}

impl PipelineContext {
    pub fn new(source_path: PathBuf) -> Self {
        Self {
            source_path,
            intermediate: None,
            page_count: 0,
            multi_page: false,
            primary_text: None,
            record: None,
            output_path: None,
        }
    }

    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
