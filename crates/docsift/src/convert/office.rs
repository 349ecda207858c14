//! Office document (DOC/DOCX) conversion through an external command.

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::config::ConverterConfig;
use crate::error::ConvertError;

/// Seam for the external office-to-PDF engine. Implementations must either
/// leave a complete PDF at `target` or fail; a partial artifact is a bug.
#[async_trait]
pub trait OfficeConverter: Send + Sync {
    async fn convert_to_pdf(&self, source: &Path, target: &Path) -> Result<(), ConvertError>;
}

/// Runs a LibreOffice-style converter: `program <args...> <outdir> <source>`.
/// The tool names its output after the source stem, so the artifact is
/// renamed onto the requested target afterwards.
pub struct CommandConverter {
    program: String,
    args: Vec<String>,
}

impl CommandConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl OfficeConverter for CommandConverter {
    async fn convert_to_pdf(&self, source: &Path, target: &Path) -> Result<(), ConvertError> {
        let out_dir = target
            .parent()
            .ok_or_else(|| ConvertError::MissingOutput(target.to_path_buf()))?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(out_dir)
            .arg(source)
            .output()
            .await
            .map_err(|e| ConvertError::CommandFailed(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            return Err(ConvertError::CommandFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // The tool writes <outdir>/<stem>.pdf; move it onto the target path.
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let produced = out_dir.join(format!("{}.pdf", stem));

        if produced != target {
            if !produced.exists() {
                return Err(ConvertError::MissingOutput(produced));
            }
            debug!("Renaming converter output {} -> {}", produced.display(), target.display());
            tokio::fs::rename(&produced, target)
                .await
                .map_err(|e| ConvertError::CommandFailed(format!(
                    "failed to move converter output: {}",
                    e
                )))?;
        }

        Ok(())
    }
}
