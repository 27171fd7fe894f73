use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "spendlens=info";

/// Install the global subscriber. `RUST_LOG` wins over the default filter.
/// Logs go to stderr so `--json` output on stdout stays clean.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
