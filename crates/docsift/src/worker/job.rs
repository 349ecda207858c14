use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// One discovered input file queued for processing.
#[derive(Debug, Clone)]
pub struct FileRef {
    pub path: PathBuf,
    pub discovered_at: DateTime<Utc>,
}

impl FileRef {
    /// Canonicalizes best-effort so the in-flight registry sees one spelling
    /// per file; a path that cannot be resolved is kept as given.
    pub fn new(path: &Path) -> Self {
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self {
            path,
            discovered_at: Utc::now(),
        }
    }
}
