use tracing_subscriber::EnvFilter;

/// Installs the process-wide tracing subscriber.
///
/// Without `RUST_LOG` set, defaults to `info` level, or `debug` when
/// `debug` is true (the `-debug` flag on both binaries).
pub fn init(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}
