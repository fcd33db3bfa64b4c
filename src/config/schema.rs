//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the greeting service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Payload served on the root route.
    pub greeting: GreetingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Greeting payload configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct GreetingConfig {
    /// Human readable greeting.
    pub message: String,

    /// Release tag reported to clients (e.g., "v1").
    pub version: String,

    /// Deployment environment. Omitted from responses when unset.
    pub environment: Option<String>,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            message: "Hello from DevFest GitOps Demo 🚀".to_string(),
            version: "v1".to_string(),
            environment: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Mount the metrics middleware and scrape route.
    pub metrics_enabled: bool,

    /// Path of the scrape route.
    pub metrics_path: String,

    /// Record status classes ("2xx") instead of exact codes.
    pub group_status_codes: bool,

    /// Histogram buckets for request latency, in seconds.
    pub latency_buckets: Vec<f64>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_path: "/metrics".to_string(),
            group_status_codes: true,
            latency_buckets: vec![0.1, 0.5, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.greeting.version, "v1");
        assert!(config.greeting.environment.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [greeting]
            environment = "production"

            [observability]
            group_status_codes = false
            "#,
        )
        .unwrap();

        assert_eq!(config.greeting.environment.as_deref(), Some("production"));
        assert_eq!(config.greeting.message, GreetingConfig::default().message);
        assert!(!config.observability.group_status_codes);
        assert_eq!(config.observability.metrics_path, "/metrics");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
    }
}
