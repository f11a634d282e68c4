//! Logging bootstrap.
//!
//! Events go to stderr; stdout is reserved for the start marker.

use tcinit_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the log filter: `RUST_LOG` when set, the configured directive otherwise.
pub fn filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    resolve_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), settings)
}

fn resolve_filter(
    env_directives: Option<String>,
    settings: &TelemetrySettings,
) -> anyhow::Result<EnvFilter> {
    match env_directives {
        Some(directives) if !directives.trim().is_empty() => {
            parse_directives(&directives, EnvFilter::DEFAULT_ENV)
        }
        _ => parse_directives(&settings.filter, "telemetry.filter"),
    }
}

fn parse_directives(directives: &str, origin: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(directives)
        .map_err(|e| anyhow::anyhow!("invalid log filter '{}' from {}: {}", directives, origin, e))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = filter(settings)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(format = ?settings.log_format, "telemetry initialized");
    }

    Ok(())
}
