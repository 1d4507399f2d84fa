//! Telemetry configuration from environment variables.

use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,

    /// Filter directive (`info`, `sm_04_stream_fetcher=debug,info`, ...)
    pub log_level: String,

    /// JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "stream-mirror".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// JSON logs default on when running under Kubernetes or Docker.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let is_container = var("KUBERNETES_SERVICE_HOST").is_some() || var("DOCKER_CONTAINER").is_some();

        Self {
            service_name: var("SM_SERVICE_NAME").unwrap_or_else(|| "stream-mirror".to_string()),

            log_level: var("SM_LOG_LEVEL")
                .or_else(|| var("RUST_LOG"))
                .unwrap_or_else(|| "info".to_string()),

            json_logs: var("SM_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::from_lookup(lookup(&[]));
        assert_eq!(config, TelemetryConfig::default());
    }

    #[test]
    fn test_level_precedence() {
        let config = TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "debug")]));
        assert_eq!(config.log_level, "debug");

        let config =
            TelemetryConfig::from_lookup(lookup(&[("RUST_LOG", "debug"), ("SM_LOG_LEVEL", "warn")]));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_json_logs() {
        assert!(TelemetryConfig::from_lookup(lookup(&[("SM_JSON_LOGS", "1")])).json_logs);
        assert!(TelemetryConfig::from_lookup(lookup(&[("DOCKER_CONTAINER", "yes")])).json_logs);
        assert!(
            !TelemetryConfig::from_lookup(lookup(&[
                ("DOCKER_CONTAINER", "yes"),
                ("SM_JSON_LOGS", "false")
            ]))
            .json_logs
        );
    }
}
