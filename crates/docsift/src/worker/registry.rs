//! At-most-once admission for files currently being processed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

/// Set of paths currently claimed by a worker. A file enters via
/// [`try_claim`](InFlightRegistry::try_claim) and leaves when the returned
/// ticket drops, so release happens on every exit path including panics.
#[derive(Default)]
pub struct InFlightRegistry {
    in_flight: Mutex<HashSet<PathBuf>>,
}

impl InFlightRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claims `path` for exclusive processing. Returns `None` when another
    /// worker already holds it.
    pub fn try_claim(self: &Arc<Self>, path: &Path) -> Option<ClaimTicket> {
        let mut guard = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !guard.insert(path.to_path_buf()) {
            return None;
        }
        Some(ClaimTicket {
            registry: Arc::clone(self),
            path: path.to_path_buf(),
        })
    }

    pub fn contains(&self, path: &Path) -> bool {
        let guard = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        guard.contains(path)
    }

    pub fn len(&self) -> usize {
        let guard = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        guard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, path: &Path) {
        let mut guard = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(path);
    }
}

/// RAII claim on one path in the registry.
pub struct ClaimTicket {
    registry: Arc<InFlightRegistry>,
    path: PathBuf,
}

impl ClaimTicket {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ClaimTicket {
    fn drop(&mut self) {
        debug!("Releasing claim on {}", self.path.display());
        self.registry.release(&self.path);
    }
}
