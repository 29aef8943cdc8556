use super::init_tracing::DEFAULT_LOG_FILTER;

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub filter: String,
}

impl TracingConfig {
    /// Settings-driven values, still overridable with `LOG_FORMAT=json`.
    pub fn new(environment: impl Into<String>, json_format: bool, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        Self {
            environment: environment.into(),
            json_format: json_format || log_format_is_json(),
            filter: if filter.trim().is_empty() {
                DEFAULT_LOG_FILTER.to_string()
            } else {
                filter
            },
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".to_string()),
            json_format: log_format_is_json(),
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

fn log_format_is_json() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false)
}
