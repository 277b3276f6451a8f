use tracing_subscriber::{EnvFilter, fmt};

use crate::infrastructure::config::{AppConfig, DEFAULT_LOG_FILTER, LogFormat};

/// Installs the global subscriber. A filter that fails to parse falls back
/// to the default one instead of silencing the service.
pub fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let builder = fmt()
        .with_env_filter(filter)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let installed = match config.log_format {
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_target(false).json().finish())
        }
        LogFormat::Pretty => {
            tracing::subscriber::set_global_default(builder.with_target(true).pretty().finish())
        }
    };

    if installed.is_ok() {
        tracing::info!(
            filter = %config.log_filter,
            format = ?config.log_format,
            "logging initialized"
        );
    }
}
