//! Tracing setup for consumers that want default output.

use tracing_subscriber::EnvFilter;

/// Initialize a global `tracing` subscriber honoring `RUST_LOG`,
/// defaulting to warnings. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
