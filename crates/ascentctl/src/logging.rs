//! Tracing setup for ascentctl.
//!
//! RUST_LOG wins when set; otherwise the config's `[log] level` is used.
//! Logs go to stderr so stdout stays clean for `--json`.
//!
//! The config itself is loaded under a scoped bootstrap subscriber, since
//! the level it carries is not known until it has been read.

use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Level used before the config is read
pub const BOOTSTRAP_LEVEL: &str = "info";

/// Build the filter: RUST_LOG if it parses, else `fallback`, else `info`
pub fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Formatting subscriber writing to `writer`
pub fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .finish()
}

/// Run `f` with a stderr subscriber at the bootstrap level
pub fn bootstrap<T>(f: impl FnOnce() -> T) -> T {
    tracing::subscriber::with_default(subscriber(filter(BOOTSTRAP_LEVEL), std::io::stderr), f)
}

/// Install the global subscriber. Safe to call more than once.
pub fn init(fallback: &str) {
    let _ = subscriber(filter(fallback), std::io::stderr).try_init();
}
