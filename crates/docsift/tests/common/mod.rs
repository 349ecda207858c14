//! Shared fixtures for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;

use docsift::classify::{Classifier, DeepExtractor};
use docsift::convert::{Normalizer, OfficeConverter, PdfTextExtractor, StatementTextExtractor};
use docsift::error::ConvertError;
use docsift::output::OutputWriter;
use docsift::pipeline::{BatchTempDir, Pipeline, PipelineConfig};

/// Writes a PDF at `path` with one text body per page.
pub fn write_pdf(path: &Path, pages: &[&str]) {
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
    doc.save(path).unwrap();
}

/// Office conversion stub for environments without a converter binary.
pub struct NoOffice;

#[async_trait]
impl OfficeConverter for NoOffice {
    async fn convert_to_pdf(&self, _source: &Path, _target: &Path) -> Result<(), ConvertError> {
        Err(ConvertError::CommandFailed("no office converter in tests".to_string()))
    }
}

/// Classifier stub returning a fixed label and payload.
pub struct FixedClassifier {
    pub label: String,
    pub payload: Value,
}

#[async_trait]
impl Classifier for FixedClassifier {
    async fn classify(&self, _text: &str, _multi_page: bool) -> (String, Value) {
        (self.label.clone(), self.payload.clone())
    }
}

/// Deep extractor stub returning a fixed payload.
pub struct FixedDeepExtractor {
    pub payload: Value,
}

#[async_trait]
impl DeepExtractor for FixedDeepExtractor {
    async fn extract(&self, _full_text: &str) -> Value {
        self.payload.clone()
    }
}

/// Classifier that must not be reached.
pub struct UnreachableClassifier;

#[async_trait]
impl Classifier for UnreachableClassifier {
    async fn classify(&self, _text: &str, _multi_page: bool) -> (String, Value) {
        panic!("classifier must not be called for this document");
    }
}

/// Deep extractor that must not be reached.
pub struct UnreachableDeepExtractor;

#[async_trait]
impl DeepExtractor for UnreachableDeepExtractor {
    async fn extract(&self, _full_text: &str) -> Value {
        panic!("deep extractor must not be called for this document");
    }
}

pub struct TestHarness {
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub scratch: BatchTempDir,
}

impl TestHarness {
    pub fn new(base: &Path) -> Self {
        let input_root = base.join("in");
        let output_root = base.join("out");
        std::fs::create_dir_all(&input_root).unwrap();
        Self {
            input_root,
            output_root,
            scratch: BatchTempDir::create().unwrap(),
        }
    }

    /// Pipeline with real conversion and extraction, stubbed model backend.
    pub fn pipeline(
        &self,
        classifier: Arc<dyn Classifier>,
        deep: Arc<dyn DeepExtractor>,
    ) -> Arc<Pipeline> {
        let config = Arc::new(PipelineConfig {
            input_root: self.input_root.clone(),
            output_root: self.output_root.clone(),
            temp_dir: self.scratch.path().to_path_buf(),
            max_classify_chars: 30_000,
        });
        Arc::new(Pipeline::with_components(
            config,
            Normalizer::new(Arc::new(NoOffice)),
            Box::new(PdfTextExtractor),
            Box::new(StatementTextExtractor),
            classifier,
            deep,
            OutputWriter::new(&self.input_root, &self.output_root),
        ))
    }

    pub fn read_record(&self, relative: &str) -> Value {
        let raw = std::fs::read_to_string(self.output_root.join(relative)).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}
