//! Configuration validation.
//!
//! Serde handles the syntactic side; this pass checks values that parse fine
//! but cannot run. Every problem is reported, not only the first one.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("greeting.{0} must not be empty")]
    EmptyGreetingField(&'static str),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("observability.metrics_path `{0}` must start with '/' and differ from the root route")]
    InvalidMetricsPath(String),

    #[error("observability.latency_buckets must not be empty")]
    NoLatencyBuckets,

    #[error("observability.latency_buckets must be positive and strictly increasing")]
    UnorderedLatencyBuckets,
}

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.greeting.message.trim().is_empty() {
        errors.push(ValidationError::EmptyGreetingField("message"));
    }
    if config.greeting.version.trim().is_empty() {
        errors.push(ValidationError::EmptyGreetingField("version"));
    }
    if matches!(config.greeting.environment.as_deref(), Some(env) if env.trim().is_empty()) {
        errors.push(ValidationError::EmptyGreetingField("environment"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    let observability = &config.observability;
    if observability.metrics_enabled {
        let path = observability.metrics_path.as_str();
        if !path.starts_with('/') || path == "/" {
            errors.push(ValidationError::InvalidMetricsPath(path.to_string()));
        }

        let buckets = &observability.latency_buckets;
        if buckets.is_empty() {
            errors.push(ValidationError::NoLatencyBuckets);
        } else if buckets[0] <= 0.0 || buckets.windows(2).any(|w| w[0] >= w[1]) {
            errors.push(ValidationError::UnorderedLatencyBuckets);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
