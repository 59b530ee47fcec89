//! Configuration validation.
//!
//! Semantic checks that serde cannot express. Every problem is collected so a
//! broken config file is reported in one pass.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::ApiConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ApiConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be > 0"));
    }
    if config.rate_limit.window_ms == 0 {
        errors.push(ValidationError::new("rate_limit.window_ms", "must be > 0"));
    }
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new("rate_limit.sweep_interval_secs", "must be > 0"));
    }

    if config.csrf.ttl_secs == 0 {
        errors.push(ValidationError::new("csrf.ttl_secs", "must be > 0"));
    }
    if matches!(config.csrf.secret.as_deref(), Some(s) if s.len() < 16) {
        errors.push(ValidationError::new("csrf.secret", "must be at least 16 bytes"));
    }
    if config.csrf.cookie_name.is_empty()
        || !config
            .csrf
            .cookie_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::new("csrf.cookie_name", "must be a non-empty token"));
    }

    // Padding that outlives the request timeout would turn every call into a 408.
    let padding_ms = config.latency.target_ms.saturating_add(config.latency.jitter_ms);
    if padding_ms >= config.timeouts.request_secs.saturating_mul(1000) {
        errors.push(ValidationError::new(
            "latency.target_ms",
            "target plus jitter must stay below the request timeout",
        ));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("unknown format '{}'", config.observability.log_format),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "is not a socket address",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    if config.autosave.interval_secs == 0 {
        errors.push(ValidationError::new("autosave.interval_secs", "must be > 0"));
    }
    if config.autosave.encrypt
        && config.autosave.passphrase.as_deref().map_or(true, str::is_empty)
    {
        errors.push(ValidationError::new(
            "autosave.passphrase",
            "required when autosave.encrypt is set",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
