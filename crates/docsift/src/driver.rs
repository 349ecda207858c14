//! Entry points: one-shot batch processing and continuous watching.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{DocsiftError, OutputError, Result};
use crate::pipeline::{BatchTempDir, Outcome, Pipeline, PipelineConfig};
use crate::worker::{FileRef, FileStatus, InFlightRegistry, IngestionWatcher, WorkerPool};

/// Result of one batch run over an input tree.
#[derive(Debug)]
pub struct BatchSummary {
    /// Files that matched a supported extension and were queued.
    pub attempted: usize,
    pub statuses: Vec<FileStatus>,
}

impl BatchSummary {
    pub fn saved(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Saved(_)))
    }

    pub fn skipped_empty(&self) -> usize {
        self.count(|o| matches!(o, Outcome::SkippedEmpty(_)))
    }

    pub fn skipped_error(&self) -> usize {
        self.count(|o| matches!(o, Outcome::SkippedError(_)))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.statuses.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Validates and canonicalizes the input root. Discovered files are
/// canonicalized too, so a relative or symlink-containing root configured
/// verbatim would defeat relative-path mirroring in the writer.
pub fn resolve_input_root(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(DocsiftError::InvalidInputRoot(path.to_path_buf()));
    }
    path.canonicalize()
        .map_err(|_| DocsiftError::InvalidInputRoot(path.to_path_buf()))
}

fn build_pipeline(app: &Config, input_root: &Path, temp_dir: &Path) -> Arc<Pipeline> {
    let config = Arc::new(PipelineConfig {
        input_root: input_root.to_path_buf(),
        output_root: Path::new(&app.output_directory).to_path_buf(),
        temp_dir: temp_dir.to_path_buf(),
        max_classify_chars: app.llm.max_input_chars,
    });
    Arc::new(Pipeline::from_config(app, config))
}

fn create_scratch() -> Result<BatchTempDir> {
    BatchTempDir::create().map_err(|e| {
        DocsiftError::Output(OutputError::CreateDirectory {
            path: std::env::temp_dir(),
            source: e,
        })
    })
}

/// Drains `files` through `worker_count` workers and collects outcomes.
/// Shared with tests so the model backend can be injected.
pub async fn run_batch(
    pipeline: Arc<Pipeline>,
    registry: Arc<InFlightRegistry>,
    files: Vec<FileRef>,
    worker_count: usize,
) -> BatchSummary {
    let attempted = files.len();
    let (tx, rx) = mpsc::channel(attempted.max(1));
    let (result_tx, mut result_rx) = mpsc::unbounded_channel();

    let pool = WorkerPool::start(pipeline, registry, rx, worker_count, result_tx);
    for file in files {
        if tx.send(file).await.is_err() {
            warn!("Queue closed before all files were submitted");
            break;
        }
    }
    drop(tx);
    pool.join().await;

    let mut statuses = Vec::with_capacity(attempted);
    while let Ok(status) = result_rx.try_recv() {
        statuses.push(status);
    }

    BatchSummary {
        attempted,
        statuses,
    }
}

/// Processes every supported file under the configured input directory once
/// and returns per-file outcomes.
pub async fn process_folder(app: &Config) -> Result<BatchSummary> {
    app.validate()?;
    let input_root = resolve_input_root(Path::new(&app.input_directory))?;

    let scratch = create_scratch()?;
    let pipeline = build_pipeline(app, &input_root, scratch.path());

    let mut files = Vec::new();
    for entry in WalkDir::new(&input_root).follow_links(false) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() && app.is_supported(entry.path()) {
            files.push(FileRef::new(entry.path()));
        }
    }
    info!("Processing {} file(s) under {}", files.len(), input_root.display());

    let summary = run_batch(pipeline, InFlightRegistry::new(), files, app.worker_count).await;
    info!(
        "Batch complete: {} saved, {} empty, {} failed of {} attempted",
        summary.saved(),
        summary.skipped_empty(),
        summary.skipped_error(),
        summary.attempted
    );
    Ok(summary)
}

/// Watches the configured input directory indefinitely, processing files as
/// they stabilize. Returns only if the internal queue shuts down.
pub async fn watch_folder(app: &Config) -> Result<()> {
    app.validate()?;
    let input_root = resolve_input_root(Path::new(&app.input_directory))?;

    let scratch = create_scratch()?;
    let pipeline = build_pipeline(app, &input_root, scratch.path());
    let registry = InFlightRegistry::new();

    let (tx, rx) = mpsc::channel(app.worker_count * 2);
    let (result_tx, mut result_rx) = mpsc::unbounded_channel();

    let pool = WorkerPool::start(pipeline, Arc::clone(&registry), rx, app.worker_count, result_tx);

    let reporter = tokio::spawn(async move {
        while let Some(status) = result_rx.recv().await {
            match status.outcome {
                Outcome::Saved(path) => {
                    info!("{} -> {}", status.file.path.display(), path.display())
                }
                Outcome::SkippedEmpty(path) => info!(
                    "{} had no extractable text; degraded record at {}",
                    status.file.path.display(),
                    path.display()
                ),
                Outcome::SkippedError(reason) => {
                    warn!("{} failed: {}", status.file.path.display(), reason)
                }
            }
        }
    });

    IngestionWatcher::new(app, registry, tx).run().await;
    pool.join().await;
    let _ = reporter.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_input_root_rejected() {
        let raw = r#"{"input_directory": "/definitely/not/here", "output_directory": "/tmp/out"}"#;
        let config: Config = serde_json::from_str(raw).unwrap();
        let result = process_folder(&config).await;
        assert!(matches!(result, Err(DocsiftError::InvalidInputRoot(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_any_work() {
        let dir = tempfile::tempdir().unwrap();
        let raw = format!(
            r#"{{"input_directory": "{}", "output_directory": "/tmp/out", "worker_count": 0}}"#,
            dir.path().display()
        );
        let config: Config = serde_json::from_str(&raw).unwrap();
        let result = process_folder(&config).await;
        assert!(matches!(result, Err(DocsiftError::Config(_))));
    }

    #[test]
    fn test_input_root_resolves_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real_in");
        std::fs::create_dir_all(&real).unwrap();
        let link = dir.path().join("link_in");
        #[cfg(unix)]
        std::os::unix::fs::symlink(&real, &link).unwrap();

        #[cfg(unix)]
        assert_eq!(
            resolve_input_root(&link).unwrap(),
            real.canonicalize().unwrap()
        );
    }
}
