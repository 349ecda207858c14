//! Worker pool draining the processing queue.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::pipeline::{Outcome, Pipeline, PipelineContext};

use super::job::FileRef;
use super::registry::InFlightRegistry;

/// Per-file terminal state reported back to the caller.
#[derive(Debug)]
pub struct FileStatus {
    pub file: FileRef,
    pub outcome: Outcome,
}

pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Starts `worker_count` tasks sharing the queue. Each file is claimed
    /// in the registry before processing; the claim drops with the ticket
    /// whether the run succeeds, skips, or panics.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn start(
        pipeline: Arc<Pipeline>,
        registry: Arc<InFlightRegistry>,
        receiver: mpsc::Receiver<FileRef>,
        worker_count: usize,
        results: mpsc::UnboundedSender<FileStatus>,
    ) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let pipeline = Arc::clone(&pipeline);
            let registry = Arc::clone(&registry);
            let receiver = Arc::clone(&receiver);
            let results = results.clone();

            workers.push(tokio::spawn(async move {
                run_worker(worker_id, pipeline, registry, receiver, results).await;
            }));
        }

        info!("Started {} worker(s)", worker_count);
        Self { workers }
    }

    /// Waits for all workers to finish. Workers exit when the queue closes.
    pub async fn join(self) {
        for handle in self.workers {
            if let Err(e) = handle.await {
                error!("Worker task failed: {}", e);
            }
        }
    }
}

async fn run_worker(
    worker_id: usize,
    pipeline: Arc<Pipeline>,
    registry: Arc<InFlightRegistry>,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<FileRef>>>,
    results: mpsc::UnboundedSender<FileStatus>,
) {
    loop {
        let file = {
            let mut rx = receiver.lock().await;
            rx.recv().await
        };
        let Some(file) = file else {
            debug!("Worker {} stopping: queue closed", worker_id);
            return;
        };

        let Some(_ticket) = registry.try_claim(&file.path) else {
            debug!("Worker {} skipping {}: already in flight", worker_id, file.path.display());
            continue;
        };

        // A panic in any stage is contained here: the document becomes a
        // SkippedError and the worker keeps draining the queue. The claim
        // ticket and any temp artifact release during the unwind.
        let run = AssertUnwindSafe(pipeline.run(PipelineContext::new(file.path.clone())));
        let outcome = match run.catch_unwind().await {
            Ok((outcome, ctx)) => {
                drop(ctx);
                outcome
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(
                    "Worker {} recovered from panic while processing {}: {}",
                    worker_id,
                    file.path.display(),
                    reason
                );
                Outcome::SkippedError(format!("panicked: {}", reason))
            }
        };

        if results.send(FileStatus { file, outcome }).is_err() {
            debug!("Worker {} stopping: result channel closed", worker_id);
            return;
        }
    }
}
