//! Page counting and text extraction over the PDF intermediate.

use std::path::Path;

use lopdf::Document;
use tracing::{debug, warn};

/// Number of pages in the PDF at `path`. Returns 0 when the file cannot be
/// loaded; callers treat an unknown count permissively.
pub fn page_count(path: &Path) -> usize {
    match Document::load(path) {
        Ok(doc) => doc.get_pages().len(),
        Err(e) => {
            warn!("Could not determine page count for {}: {}", path.display(), e);
            0
        }
    }
}

/// Text extraction over a normalized PDF. Implementations never fail: a
/// document that yields no text returns an empty string and the caller
/// decides how to degrade.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, pdf: &Path) -> String;
}

/// Extracts embedded text page by page, joined with blank lines.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, pdf: &Path) -> String {
        let doc = match Document::load(pdf) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Failed to load {} for extraction: {}", pdf.display(), e);
                return String::new();
            }
        };

        let mut pages_text = Vec::new();
        for (&page_num, _) in doc.get_pages().iter() {
            match doc.extract_text(&[page_num]) {
                Ok(text) => pages_text.push(text),
                Err(e) => {
                    debug!("No text on page {} of {}: {}", page_num, pdf.display(), e);
                }
            }
        }

        pages_text.join("\n\n").trim().to_string()
    }
}

/// Variant tuned for tabular statements: each page is emitted under an
/// explicit page marker and trailing whitespace is trimmed per line, so
/// transaction rows survive downstream prompt assembly intact.
pub struct StatementTextExtractor;

impl TextExtractor for StatementTextExtractor {
    fn extract(&self, pdf: &Path) -> String {
        let doc = match Document::load(pdf) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Failed to load {} for extraction: {}", pdf.display(), e);
                return String::new();
            }
        };

        let mut sections = Vec::new();
        for (&page_num, _) in doc.get_pages().iter() {
            let text = match doc.extract_text(&[page_num]) {
                Ok(text) => text,
                Err(e) => {
                    debug!("No text on page {} of {}: {}", page_num, pdf.display(), e);
                    continue;
                }
            };
            let body: String = text
                .lines()
                .map(|line| line.trim_end())
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("--- Page {} ---\n{}", page_num, body));
        }

        sections.join("\n\n").trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pdf(dir: &Path, pages: &[&str]) -> std::path::PathBuf {
        use lopdf::{dictionary, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = format!("BT\n/F1 12 Tf\n72 700 Td\n({}) Tj\nET", text);
            let content_id =
                doc.add_object(Object::Stream(Stream::new(dictionary! {}, content.into_bytes())));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let path = dir.join("sample.pdf");
        doc.save(&path).unwrap();
        path
    }

    #[test]
    fn test_page_count_matches_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_pdf(dir.path(), &["one", "two", "three"]);
        assert_eq!(page_count(&path), 3);
    }

    #[test]
    fn test_page_count_zero_on_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        assert_eq!(page_count(&path), 0);
    }

    #[test]
    fn test_extractor_reads_all_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_pdf(dir.path(), &["Opening Balance 100", "Closing Balance 90"]);

        let text = PdfTextExtractor.extract(&path);
        assert!(text.contains("Opening Balance 100"));
        assert!(text.contains("Closing Balance 90"));
    }

    #[test]
    fn test_extractor_empty_on_broken_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"definitely not a pdf").unwrap();
        assert_eq!(PdfTextExtractor.extract(&path), "");
    }

    #[test]
    fn test_statement_extractor_marks_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample_pdf(dir.path(), &["Salary Credit 5000", "ATM Withdrawal 200"]);

        let text = StatementTextExtractor.extract(&path);
        assert!(text.contains("--- Page 1 ---"));
        assert!(text.contains("--- Page 2 ---"));
        assert!(text.contains("Salary Credit 5000"));
        assert!(text.contains("ATM Withdrawal 200"));
    }
}
