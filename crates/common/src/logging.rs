use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogFormat;

/// Installs the global subscriber. `RUST_LOG` takes precedence over
/// `default_level`; repeated calls are no-ops.
pub fn init_logging(default_level: &str, format: LogFormat) {
    if tracing::dispatcher::has_been_set() {
        return;
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
