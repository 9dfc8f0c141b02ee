//! Tracing setup for the service process.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. Filtering follows `RUST_LOG`, with
/// info-level output by default. Safe to call once per process; later calls
/// are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
