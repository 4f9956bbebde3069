//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process with the default filter.
///
/// Safe to call multiple times (subsequent calls are no-ops), so engines,
/// gateway clients, and test harnesses can all call it without coordination.
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing with an explicit fallback filter, still overridable
/// via `RUST_LOG`.
pub fn init_with_filter(fallback: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    // JSON logs + timestamps; engine spans carry the aggregate id and the
    // acting user, so downstream log search can follow one reconciliation.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
