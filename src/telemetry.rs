//! Tracing subscriber setup.

use tracing_subscriber::{
    EnvFilter, fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Installs the global `fmt` subscriber filtered by `RUST_LOG`, falling back
/// to `default_filter`.
///
/// # Errors
///
/// Returns [`TryInitError`] when a global subscriber is already installed;
/// the existing one stays in place.
pub fn init_tracing(default_filter: &str) -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_thread_names(true))
        .try_init()
}
