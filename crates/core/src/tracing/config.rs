//! Configuration for tracing and instrumentation

use serde::{Deserialize, Serialize};

/// Output format of the log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Main instrumentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name for tracing
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log level filter (e.g., "info", "debug", "folio_http=trace")
    pub log_level: String,
    /// Log line format
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "folio".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InstrumentationConfig::default();
        assert_eq!(config.service_name, "folio");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let config: InstrumentationConfig = serde_json::from_str(
            r#"{"service_name":"x","service_version":"1","log_level":"warn","format":"json"}"#,
        )
        .unwrap();
        assert_eq!(config.format, LogFormat::Json);

        let config: InstrumentationConfig = serde_json::from_str(
            r#"{"service_name":"x","service_version":"1","log_level":"warn"}"#,
        )
        .unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
    }
}
