//! Writes final JSON records into an output tree mirroring the input tree.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{info, warn};

use crate::error::OutputError;

pub struct OutputWriter {
    input_root: PathBuf,
    output_root: PathBuf,
}

impl OutputWriter {
    pub fn new(input_root: &Path, output_root: &Path) -> Self {
        Self {
            input_root: input_root.to_path_buf(),
            output_root: output_root.to_path_buf(),
        }
    }

    /// Output path for `source`: same relative position under the output
    /// root, extension replaced with `.json`. A source outside the input
    /// root lands flat in the output root under its own file name.
    pub fn target_for(&self, source: &Path) -> PathBuf {
        let relative = match source.strip_prefix(&self.input_root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => {
                warn!(
                    "{} is outside the input root; writing its record at the top of the output tree",
                    source.display()
                );
                PathBuf::from(source.file_name().unwrap_or_default())
            }
        };

        let mut target = self.output_root.join(relative);
        target.set_extension("json");
        target
    }

    /// Serializes `record` to its mirrored path, creating parent directories
    /// as needed. An existing record for the same source is overwritten.
    pub fn write(&self, source: &Path, record: &Value) -> Result<PathBuf, OutputError> {
        let target = self.target_for(source);

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| OutputError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let rendered = serde_json::to_string_pretty(record)?;
        std::fs::write(&target, rendered).map_err(|e| OutputError::WriteFile {
            path: target.clone(),
            source: e,
        })?;

        info!("Saved record for {} to {}", source.display(), target.display());
        Ok(target)
    }
}
