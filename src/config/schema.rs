//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the API.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API server and drafting client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ApiConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// CSRF token settings.
    pub csrf: CsrfConfig,

    /// Response latency padding.
    pub latency: LatencyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,

    pub autosave: AutoSaveConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 10 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Requests admitted per client within one window.
    pub max_requests: u32,

    /// Window length in milliseconds.
    pub window_ms: u64,

    /// How often expired entries are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 5,
            window_ms: 60_000,
            sweep_interval_secs: 60,
        }
    }
}

/// CSRF token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CsrfConfig {
    /// Signing secret. A random secret is generated at startup when unset,
    /// which invalidates outstanding tokens on every restart.
    pub secret: Option<String>,

    /// Token lifetime in seconds.
    pub ttl_secs: u64,

    /// Reject contact submissions that carry no token at all.
    pub require_for_contact: bool,

    /// Name of the cookie set alongside issued tokens.
    pub cookie_name: String,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            secret: None,
            ttl_secs: 3600,
            require_for_contact: false,
            cookie_name: "csrf_token".to_string(),
        }
    }
}

/// Constant-latency padding for state-changing endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LatencyConfig {
    /// Minimum time before a padded response is released, in milliseconds.
    pub target_ms: u64,

    /// Upper bound (exclusive) of random extra delay, in milliseconds.
    pub jitter_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            target_ms: 500,
            jitter_ms: 100,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,

    /// Take the client identifier from X-Forwarded-For / X-Real-IP.
    /// Only safe behind a proxy that overwrites these headers.
    pub trust_forwarded_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
            trust_forwarded_headers: false,
        }
    }
}

/// Where drafts are persisted by the auto-save store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Durable until explicitly cleared.
    Local,
    /// Lives only as long as the owning process.
    Session,
}

/// Draft auto-save configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Quiet period after the last change before saving, in milliseconds.
    pub debounce_ms: u64,

    /// Periodic save interval while changes are pending, in seconds.
    pub interval_secs: u64,

    /// Initial storage backend.
    pub storage: StorageKind,

    /// Directory used by the local backend.
    pub storage_dir: String,

    /// Encrypt persisted drafts.
    pub encrypt: bool,

    /// Passphrase the encryption key is derived from.
    pub passphrase: Option<String>,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 2_000,
            interval_secs: 30,
            storage: StorageKind::Local,
            storage_dir: ".dfd-drafts".to_string(),
            encrypt: false,
            passphrase: None,
        }
    }
}
