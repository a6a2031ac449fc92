use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, writing to stderr. A non-empty `RUST_LOG`
/// replaces the default `d0010_ingest` directive entirely.
pub fn init_tracing(verbose: bool) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(rust_log.as_deref(), verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn env_filter(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(format!("d0010_ingest={level}")))
}
