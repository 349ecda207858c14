use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::classify::{Classifier, DeepExtractor, LlmClassifier, LlmClient, LlmDeepExtractor};
use crate::config::Config;
use crate::convert::{
    page_count, CommandConverter, Normalizer, PdfTextExtractor, StatementTextExtractor,
    TextExtractor,
};
use crate::output::OutputWriter;
use crate::schema::{BankStatement, DocKind, DocumentRecord};

use super::config::PipelineConfig;
use super::context::PipelineContext;
use super::error::PipelineError;
use super::temp::TempArtifact;

/// Terminal state of one document's run. Every admitted document ends in
/// exactly one of these; no state raises past the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Record written at the contained path.
    Saved(PathBuf),
    /// No text could be extracted; a degraded record was written.
    SkippedEmpty(PathBuf),
    /// Processing failed; nothing (or nothing further) was written.
    SkippedError(String),
}

pub struct Pipeline {
    config: Arc<PipelineConfig>,
    normalizer: Normalizer,
    extractor: Box<dyn TextExtractor>,
    statement_extractor: Box<dyn TextExtractor>,
    classifier: Arc<dyn Classifier>,
    deep_extractor: Arc<dyn DeepExtractor>,
    writer: OutputWriter,
}

impl Pipeline {
    /// Production constructor — builds all sub-components from config.
    pub fn from_config(app: &Config, config: Arc<PipelineConfig>) -> Self {
        let client = LlmClient::from_config(&app.llm);
        let classifier = Arc::new(LlmClassifier::new(client.clone(), &app.llm.classify_model));
        let deep_extractor = Arc::new(LlmDeepExtractor::new(client, &app.llm.extract_model));
        let normalizer = Normalizer::new(Arc::new(CommandConverter::new(&app.converter)));
        let writer = OutputWriter::new(&config.input_root, &config.output_root);

        Self {
            config,
            normalizer,
            extractor: Box::new(PdfTextExtractor),
            statement_extractor: Box::new(StatementTextExtractor),
            classifier,
            deep_extractor,
            writer,
        }
    }

    /// Constructor with injected sub-components, used by tests to swap the
    /// model backend and extraction strategies.
    pub fn with_components(
        config: Arc<PipelineConfig>,
        normalizer: Normalizer,
        extractor: Box<dyn TextExtractor>,
        statement_extractor: Box<dyn TextExtractor>,
        classifier: Arc<dyn Classifier>,
        deep_extractor: Arc<dyn DeepExtractor>,
        writer: OutputWriter,
    ) -> Self {
        Self {
            config,
            normalizer,
            extractor,
            statement_extractor,
            classifier,
            deep_extractor,
            writer,
        }
    }

    /// Run the full pipeline for a single document.
    /// Returns an (Outcome, PipelineContext) pair; dropping the context
    /// removes the PDF intermediate.
    pub async fn run(&self, ctx: PipelineContext) -> (Outcome, PipelineContext) {
        let span = info_span!("document", source = %ctx.source_path.display());
        self.run_inner(ctx).instrument(span).await
    }

    async fn run_inner(&self, mut ctx: PipelineContext) -> (Outcome, PipelineContext) {
        // Step 1: Normalize to a PDF intermediate
        if let Err(e) = self
            .step_normalize(&mut ctx)
            .instrument(info_span!("normalize"))
            .await
        {
            warn!("Normalization failed for {}: {}", ctx.source_path.display(), e);
            return (Outcome::SkippedError(e.to_string()), ctx);
        }

        // Step 2: Inspect page structure
        {
            let _step = info_span!("inspect").entered();
            self.step_inspect(&mut ctx);
        }

        // Step 3: Primary text extraction
        {
            let _step = info_span!("extract_text").entered();
            self.step_extract(&mut ctx);
        }

        let primary = ctx.primary_text.as_deref().unwrap_or("");
        if primary.trim().is_empty() {
            info!("No text extracted from {}; writing degraded record", ctx.source_path.display());
            let record = DocumentRecord::simple_text(&ctx.file_name(), "");
            return match self.emit(&mut ctx, &record) {
                Ok(path) => (Outcome::SkippedEmpty(path), ctx),
                Err(e) => (Outcome::SkippedError(e.to_string()), ctx),
            };
        }

        // Step 4: Classify and validate
        self.step_classify(&mut ctx)
            .instrument(info_span!("classify"))
            .await;

        // Step 5: Deep extraction for multi-page bank statements
        self.step_deep_extract(&mut ctx)
            .instrument(info_span!("deep_extract"))
            .await;

        // Step 6: Emit the record
        let record = ctx.record.take().expect("record set in step 4");
        match self.emit(&mut ctx, &record) {
            Ok(path) => (Outcome::Saved(path), ctx),
            Err(e) => {
                warn!("Could not save record for {}: {}", ctx.source_path.display(), e);
                (Outcome::SkippedError(e.to_string()), ctx)
            }
        }
    }

    async fn step_normalize(&self, ctx: &mut PipelineContext) -> Result<(), PipelineError> {
        let artifact = TempArtifact::for_source(&self.config.temp_dir, &ctx.source_path);
        self.normalizer.to_pdf(&ctx.source_path, artifact.path()).await?;
        ctx.intermediate = Some(artifact);
        Ok(())
    }

    fn step_inspect(&self, ctx: &mut PipelineContext) {
        let intermediate = ctx.intermediate.as_ref().expect("step 1 completed");
        ctx.page_count = page_count(intermediate.path());
        // An unreadable count is treated as a single page rather than a failure.
        ctx.multi_page = ctx.page_count > 1;
        debug!("{} has {} page(s)", ctx.source_path.display(), ctx.page_count);
    }

    fn step_extract(&self, ctx: &mut PipelineContext) {
        let intermediate = ctx.intermediate.as_ref().expect("step 1 completed");
        ctx.primary_text = Some(self.extractor.extract(intermediate.path()));
    }

    async fn step_classify(&self, ctx: &mut PipelineContext) {
        let full_text = ctx.primary_text.clone().expect("step 3 completed");

        let prompt_text: String = if full_text.chars().count() > self.config.max_classify_chars {
            warn!(
                "Text from {} exceeds {} characters; truncating for classification",
                ctx.source_path.display(),
                self.config.max_classify_chars
            );
            full_text.chars().take(self.config.max_classify_chars).collect()
        } else {
            full_text.clone()
        };

        let (label, payload) = self.classifier.classify(&prompt_text, ctx.multi_page).await;
        let mut record = DocumentRecord::from_classifier(&label, payload, &full_text);

        // Plain-text results always carry the file name and the complete
        // (untruncated) extracted text.
        if record.kind() == DocKind::SimpleText {
            record = DocumentRecord::simple_text(&ctx.file_name(), &full_text);
        }

        info!("Classified {} as {}", ctx.source_path.display(), record.kind().as_str());
        ctx.record = Some(record);
    }

    async fn step_deep_extract(&self, ctx: &mut PipelineContext) {
        let is_bank = matches!(
            ctx.record.as_ref().map(DocumentRecord::kind),
            Some(DocKind::BankStatement)
        );
        if !is_bank || !ctx.multi_page {
            return;
        }

        let intermediate = ctx.intermediate.as_ref().expect("step 1 completed");
        let full_text = self.statement_extractor.extract(intermediate.path());
        if full_text.trim().is_empty() {
            warn!(
                "Statement-mode extraction produced no text for {}; keeping first-pass data",
                ctx.source_path.display()
            );
            return;
        }

        let payload = self.deep_extractor.extract(&full_text).await;
        match serde_json::from_value::<BankStatement>(payload) {
            Ok(statement) => {
                info!(
                    "Deep extraction recovered {} transaction(s) for {}",
                    statement.transactions.len(),
                    ctx.source_path.display()
                );
                ctx.record = Some(DocumentRecord::BankStatement(statement));
            }
            Err(e) => {
                warn!(
                    "Deep extraction payload failed validation ({}); keeping first-pass data",
                    e
                );
            }
        }
    }

    fn emit(
        &self,
        ctx: &mut PipelineContext,
        record: &DocumentRecord,
    ) -> Result<PathBuf, PipelineError> {
        let value = record
            .to_value()
            .map_err(crate::error::OutputError::Serialize)?;
        if value.as_object().is_some_and(|o| o.is_empty()) {
            return Err(PipelineError::EmptyPayload);
        }

        let path = self.writer.write(&ctx.source_path, &value)?;
        ctx.output_path = Some(path.clone());
        Ok(path)
    }
}
