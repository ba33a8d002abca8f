//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::audit::Severity;

/// Root configuration for the pinning gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Pinning provider endpoint and credentials.
    pub provider: ProviderConfig,

    /// Content limits enforced before any network call.
    pub limits: LimitsConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Provider rate-limit compliance.
    pub rate_limit: RateLimitConfig,

    /// Audit trail settings.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Pinning provider configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider API base URL.
    pub base_url: String,

    /// API key sent as `pinata_api_key`.
    pub api_key: String,

    /// API secret sent as `pinata_secret_api_key`.
    pub api_secret: String,

    /// JWT sent as a bearer token.
    pub jwt: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.pinata.cloud".to_string(),
            api_key: String::new(),
            api_secret: String::new(),
            jwt: String::new(),
            timeout_secs: 30,
            user_agent: concat!("pin-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// Credentials stay out of logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("jwt", &redact(&self.jwt))
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

/// Content limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum serialized JSON or file size in bytes.
    pub max_content_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_content_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts per operation, first attempt included.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Random jitter added on top of each delay, as a fraction of it.
    /// 0.0 keeps delays exact.
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_ratio: 0.0,
        }
    }
}

/// Rate-limit compliance configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Wait used when a 429 carries no usable `Retry-After`.
    pub default_retry_after_secs: u64,

    /// Upper bound applied to any provider-declared wait.
    pub max_retry_after_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_retry_after_secs: 1,
            max_retry_after_secs: 60,
        }
    }
}

/// Audit trail configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// JSON-lines audit file. Events go to the tracing log when unset.
    pub log_path: Option<String>,

    /// Rotate the audit file once it grows past this size.
    pub max_file_bytes: u64,

    /// Number of rotated files kept.
    pub max_files: u32,

    /// Webhook receiving high-severity events.
    pub webhook_url: Option<String>,

    /// Channel name forwarded in webhook payloads.
    pub webhook_channel: Option<String>,

    /// Lowest severity that triggers a webhook notification.
    pub notify_min_severity: Severity,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            max_file_bytes: 5 * 1024 * 1024, // 5MB
            max_files: 5,
            webhook_url: None,
            webhook_channel: None,
            notify_min_severity: Severity::High,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
