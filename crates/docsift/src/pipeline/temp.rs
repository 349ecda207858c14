//! Temporary artifact handling for normalized intermediates.
//!
//! Cleanup runs in `Drop`, so intermediates disappear on every exit path of
//! a document run, including early returns and panics unwinding through the
//! pipeline. Cleanup failures are logged, never raised.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// Scratch directory shared by one batch or watch session.
pub struct BatchTempDir {
    path: PathBuf,
}

impl BatchTempDir {
    pub fn create() -> std::io::Result<Self> {
        let path = std::env::temp_dir().join(format!("docsift_{}", Uuid::new_v4()));
        std::fs::create_dir_all(&path)?;
        debug!("Created scratch directory {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BatchTempDir {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!("Could not remove scratch directory {}: {}", self.path.display(), e);
        }
    }
}

/// One document's intermediate PDF inside the scratch area. The uuid suffix
/// keeps same-named sources from different subdirectories apart.
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn for_source(area: &Path, source: &Path) -> Self {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let mut suffix = Uuid::new_v4().simple().to_string();
        suffix.truncate(8);
        Self {
            path: area.join(format!("{}_{}.pdf", stem, suffix)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!("Could not remove intermediate {}: {}", self.path.display(), e);
            }
        }
    }
}
