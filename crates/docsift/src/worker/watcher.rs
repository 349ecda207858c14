//! Polling directory watcher feeding the processing queue.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::WorkerError;

use super::job::FileRef;
use super::registry::InFlightRegistry;
use super::stabilize::StabilizationChecker;

/// Scans the input root's immediate files on an interval and admits
/// supported ones to the queue once they stabilize. A file is admitted at
/// most once per session; the in-flight registry backstops races between
/// scan cycles and workers.
pub struct IngestionWatcher {
    root: PathBuf,
    extensions: Vec<String>,
    scan_interval: Duration,
    checker: StabilizationChecker,
    registry: Arc<InFlightRegistry>,
    sender: mpsc::Sender<FileRef>,
    admitted: HashSet<PathBuf>,
}

impl IngestionWatcher {
    pub fn new(
        config: &Config,
        registry: Arc<InFlightRegistry>,
        sender: mpsc::Sender<FileRef>,
    ) -> Self {
        // Canonicalized to match FileRef identities; a missing root is kept
        // verbatim and retried on later scans.
        let root = PathBuf::from(&config.input_directory);
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            extensions: config.supported_extensions.clone(),
            scan_interval: Duration::from_secs(config.watch.scan_interval_secs),
            checker: StabilizationChecker::new(&config.watch),
            registry,
            sender,
            admitted: HashSet::new(),
        }
    }

    fn is_supported(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|s| s.eq_ignore_ascii_case(ext))
    }

    /// One scan cycle: discover the root's immediate files, stabilize
    /// concurrently, enqueue. Each candidate is sent as soon as its own
    /// check settles, so a never-settling file does not hold back the rest
    /// of the cycle. Returns the number of files admitted.
    pub async fn scan_once(&mut self) -> Result<usize, WorkerError> {
        let mut candidates = Vec::new();
        for entry in WalkDir::new(&self.root).max_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", self.root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_supported(entry.path()) {
                continue;
            }

            let file = FileRef::new(entry.path());
            if self.admitted.contains(&file.path) || self.registry.contains(&file.path) {
                continue;
            }
            candidates.push(file);
        }

        if candidates.is_empty() {
            return Ok(0);
        }
        debug!("Found {} new candidate file(s)", candidates.len());

        let checker = &self.checker;
        let checks = candidates.into_iter().map(|file| {
            let sender = self.sender.clone();
            async move {
                if !checker.await_stable(&file.path).await {
                    return Ok(None);
                }
                let path = file.path.clone();
                sender.send(file).await.map_err(|_| WorkerError::QueueClosed)?;
                Ok(Some(path))
            }
        });

        let mut admitted = 0;
        for outcome in join_all(checks).await {
            if let Some(path) = outcome? {
                self.admitted.insert(path);
                admitted += 1;
            }
        }

        if admitted > 0 {
            info!("Admitted {} file(s) for processing", admitted);
        }
        Ok(admitted)
    }

    /// Runs scan cycles until the queue closes.
    pub async fn run(mut self) {
        info!("Watching {} every {:?}", self.root.display(), self.scan_interval);
        loop {
            if let Err(WorkerError::QueueClosed) = self.scan_once().await {
                info!("Processing queue closed; watcher stopping");
                return;
            }
            tokio::time::sleep(self.scan_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn test_config(root: &Path) -> Config {
        let raw = format!(
            r#"{{
                "input_directory": "{}",
                "output_directory": "/tmp/out",
                "watch": {{
                    "scan_interval_secs": 1,
                    "stabilize_poll_millis": 10,
                    "stabilize_timeout_secs": 1
                }}
            }}"#,
            root.display()
        );
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_scan_admits_immediate_supported_files_once() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"pdf").unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"jpg").unwrap();
        // Only the spool's immediate files are watched.
        std::fs::write(dir.path().join("sub/nested.pdf"), b"pdf").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let mut watcher = IngestionWatcher::new(&test_config(dir.path()), InFlightRegistry::new(), tx);

        assert_eq!(watcher.scan_once().await.unwrap(), 2);
        // Second cycle sees nothing new.
        assert_eq!(watcher.scan_once().await.unwrap(), 0);

        let mut received = Vec::new();
        while let Ok(file) = rx.try_recv() {
            received.push(file.path.file_name().unwrap().to_string_lossy().into_owned());
        }
        received.sort();
        assert_eq!(received, vec!["a.pdf", "b.jpg"]);
    }

    #[tokio::test]
    async fn test_stable_file_admitted_while_another_still_settles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ready.pdf"), b"complete").unwrap();
        let slow = dir.path().join("upload.pdf");
        std::fs::write(&slow, b"0").unwrap();

        // Keep the second file growing past the stabilization timeout.
        // Appends so the size grows monotonically; truncate-and-rewrite
        // briefly exposes size 0, which a pair of polls can mistake for
        // a settled file.
        let writer = {
            let slow = slow.clone();
            tokio::spawn(async move {
                use std::io::Write;
                for _ in 0..200u32 {
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    let mut f = std::fs::OpenOptions::new().append(true).open(&slow).unwrap();
                    f.write_all(b"x").unwrap();
                }
            })
        };

        let (tx, mut rx) = mpsc::channel(16);
        let mut watcher = IngestionWatcher::new(&test_config(dir.path()), InFlightRegistry::new(), tx);
        let scan = tokio::spawn(async move { watcher.scan_once().await });

        // The settled file arrives well before the other's timeout expires.
        let first = tokio::time::timeout(std::time::Duration::from_millis(500), rx.recv())
            .await
            .expect("stable file should be admitted before the slow one times out")
            .expect("queue open");
        assert_eq!(first.path.file_name().unwrap(), "ready.pdf");

        assert_eq!(scan.await.unwrap().unwrap(), 1);
        writer.abort();
    }

    #[tokio::test]
    async fn test_scan_skips_paths_held_by_registry() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("claimed.pdf");
        std::fs::write(&file, b"pdf").unwrap();

        let registry = InFlightRegistry::new();
        let _ticket = registry.try_claim(&file.canonicalize().unwrap());

        let (tx, _rx) = mpsc::channel(16);
        let mut watcher = IngestionWatcher::new(&test_config(dir.path()), registry, tx);
        assert_eq!(watcher.scan_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_scan_survives_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("not_here");

        let (tx, _rx) = mpsc::channel(16);
        let mut watcher = IngestionWatcher::new(&test_config(&missing), InFlightRegistry::new(), tx);
        assert_eq!(watcher.scan_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_closed_queue_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"pdf").unwrap();

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut watcher = IngestionWatcher::new(&test_config(dir.path()), InFlightRegistry::new(), tx);
        assert!(matches!(watcher.scan_once().await, Err(WorkerError::QueueClosed)));
    }
}
