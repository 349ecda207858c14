pub mod job;
pub mod pool;
pub mod registry;
pub mod stabilize;
pub mod watcher;

pub use job::FileRef;
pub use pool::{FileStatus, WorkerPool};
pub use registry::{ClaimTicket, InFlightRegistry};
pub use stabilize::StabilizationChecker;
pub use watcher::IngestionWatcher;
