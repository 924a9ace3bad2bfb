//! Logging and tracing bootstrap for the bookshelf service.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` when set, otherwise `info`. Must be
/// called once, before anything logs.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
    };

    result.map_err(|err| anyhow!("failed to install tracing subscriber: {err}"))?;

    tracing::info!(log_format = ?settings.log_format, "telemetry initialized");
    Ok(())
}
