use tracing_subscriber::{fmt, EnvFilter};

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG`
/// overrides the default `warn` filter.
pub(crate) fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second initialization, as happens across tests, is not an error.
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
