//! Normalization of heterogeneous inputs into a single-format PDF
//! intermediate, plus page counting and text extraction over it.

pub mod image;
pub mod office;
pub mod pdf;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::ConvertError;

pub use office::{CommandConverter, OfficeConverter};
pub use pdf::{page_count, PdfTextExtractor, StatementTextExtractor, TextExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Pdf,
    Image,
    Office,
}

impl SourceFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" | "gif" | "webp" => Some(Self::Image),
            "doc" | "docx" => Some(Self::Office),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// Dispatches a source file to the conversion route for its format and
/// guarantees that on success the intermediate PDF exists at `target`.
pub struct Normalizer {
    office: Arc<dyn OfficeConverter>,
}

impl Normalizer {
    pub fn new(office: Arc<dyn OfficeConverter>) -> Self {
        Self { office }
    }

    pub async fn to_pdf(&self, source: &Path, target: &Path) -> Result<(), ConvertError> {
        let extension = source.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = SourceFormat::from_extension(extension)
            .ok_or_else(|| ConvertError::UnsupportedFormat(extension.to_string()))?;

        debug!("Converting {} ({:?}) to {}", source.display(), format, target.display());

        match format {
            SourceFormat::Pdf => {
                tokio::fs::copy(source, target)
                    .await
                    .map_err(|e| ConvertError::CopyPdf {
                        from: source.to_path_buf(),
                        to: target.to_path_buf(),
                        source: e,
                    })?;
            }
            SourceFormat::Image => image::image_to_pdf(source, target)?,
            SourceFormat::Office => self.office.convert_to_pdf(source, target).await?,
        }

        if !target.exists() {
            return Err(ConvertError::MissingOutput(target.to_path_buf()));
        }

        info!("Normalized {} to PDF intermediate", source.display());
        Ok(())
    }
}
