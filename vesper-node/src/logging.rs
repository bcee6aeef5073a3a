use tracing_subscriber::EnvFilter;

/// Structured logging to stdout, filterable via `RUST_LOG`. Defaults to
/// `info` when unset.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
