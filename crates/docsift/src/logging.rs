//! Tracing subscriber setup for binaries and long-running sessions.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, honoring `RUST_LOG` with an `info`
/// default. Safe to call more than once; later calls are no-ops.
pub fn init() {
    // Bridge log-facade records from dependencies into tracing.
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
