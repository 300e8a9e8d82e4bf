use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Installs the global log subscriber.
///
/// `RUST_LOG` takes precedence over `default_filter`. Records from the `log` facade are
/// forwarded into the same subscriber.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|err| anyhow!("failed to install log subscriber: {err}"))
}
