//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `level` when it is set. An invalid
/// `level` falls back to `info`. Calling this twice is harmless; the second
/// call leaves the first subscriber in place.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
