//! Write-stabilization gate for newly discovered files.

use std::path::Path;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::WatchConfig;

/// Waits for a file's size to hold still before it may enter the queue, so
/// partially copied uploads are never admitted.
pub struct StabilizationChecker {
    poll_interval: Duration,
    timeout: Duration,
}

impl StabilizationChecker {
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.stabilize_poll_millis),
            timeout: Duration::from_secs(config.stabilize_timeout_secs),
        }
    }

    #[cfg(test)]
    pub fn with_intervals(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
        }
    }

    /// Returns true once two consecutive size samples agree. Returns false
    /// when the file disappears or the deadline passes; the file stays
    /// unadmitted and a later scan may try again.
    pub async fn await_stable(&self, path: &Path) -> bool {
        let deadline = Instant::now() + self.timeout;
        let mut last_size: Option<u64> = None;

        loop {
            let size = match tokio::fs::metadata(path).await {
                Ok(meta) => meta.len(),
                Err(e) => {
                    debug!("{} vanished while stabilizing: {}", path.display(), e);
                    return false;
                }
            };

            if last_size == Some(size) {
                return true;
            }
            last_size = Some(size);

            if Instant::now() >= deadline {
                warn!("{} did not settle within {:?}", path.display(), self.timeout);
                return false;
            }
            sleep(self.poll_interval).await;
        }
    }
}
