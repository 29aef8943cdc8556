use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

use super::TracingConfig;

pub const DEFAULT_LOG_FILTER: &str = "info,audioscribe=debug,tower_http=debug";

/// Filter precedence: `RUST_LOG`, then the configured directives, then the default.
pub fn log_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    let (json_layer, text_layer) = if config.json_format {
        let layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true);
        (Some(layer), None)
    } else {
        let layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(log_filter(&config.filter))
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    tracing::info!(
        environment = %config.environment,
        json_format = config.json_format,
        filter = %config.filter,
        "Tracing initialized"
    );
    Ok(())
}
