//! Tracing setup shared by binaries and integration tests.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber with an env-filter defaulting to
/// `driftmap=info`. Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("driftmap=info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
