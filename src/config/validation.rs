//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require provider credentials before any client is built
//! - Validate value ranges (timeouts > 0, attempts >= 1, ratios in [0, 1])
//! - Check that URLs and socket addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `provider.api_key`.
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

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let provider = &config.provider;
    if provider.api_key.trim().is_empty() {
        errors.push(ValidationError::new("provider.api_key", "is required"));
    }
    if provider.api_secret.trim().is_empty() {
        errors.push(ValidationError::new("provider.api_secret", "is required"));
    }
    if provider.jwt.trim().is_empty() {
        errors.push(ValidationError::new("provider.jwt", "is required"));
    }
    match url::Url::parse(&provider.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "provider.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "provider.base_url",
            format!("invalid URL '{}': {}", provider.base_url, e),
        )),
    }
    if provider.timeout_secs == 0 {
        errors.push(ValidationError::new("provider.timeout_secs", "must be greater than 0"));
    }

    if config.limits.max_content_bytes == 0 {
        errors.push(ValidationError::new("limits.max_content_bytes", "must be greater than 0"));
    }

    let retries = &config.retries;
    if retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if retries.base_delay_ms == 0 {
        errors.push(ValidationError::new("retries.base_delay_ms", "must be greater than 0"));
    }
    if retries.max_delay_ms < retries.base_delay_ms {
        errors.push(ValidationError::new(
            "retries.max_delay_ms",
            "must not be lower than retries.base_delay_ms",
        ));
    }
    if !(0.0..=1.0).contains(&retries.jitter_ratio) {
        errors.push(ValidationError::new("retries.jitter_ratio", "must be between 0.0 and 1.0"));
    }

    if config.rate_limit.max_retry_after_secs < config.rate_limit.default_retry_after_secs {
        errors.push(ValidationError::new(
            "rate_limit.max_retry_after_secs",
            "must not be lower than rate_limit.default_retry_after_secs",
        ));
    }

    if let Some(webhook) = &config.audit.webhook_url {
        if let Err(e) = url::Url::parse(webhook) {
            errors.push(ValidationError::new(
                "audit.webhook_url",
                format!("invalid URL: {}", e),
            ));
        }
    }
    if config.audit.log_path.is_some() && config.audit.max_files == 0 {
        errors.push(ValidationError::new("audit.max_files", "must be at least 1"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
