//! Provider rate-limit compliance.
//!
//! Sits between the retry loop and the transport. A 429 is answered by
//! waiting the provider-declared duration and resubmitting the identical
//! request once; that resubmission does not count as a retry. A second 429
//! in a row becomes `PinError::RateLimited`, which the retry loop treats as
//! an ordinary transient failure, so the total number of submissions per
//! operation stays bounded.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::audit::{AuditAction, AuditEmitter, AuditStatus, Details, Operation, Severity};
use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::pinning::transport::{ProviderRequest, ProviderResponse, Transport};
use crate::pinning::types::PinError;

pub struct RateLimitCoordinator {
    inner: Arc<dyn Transport>,
    default_wait: Duration,
    max_wait: Duration,
    audit: AuditEmitter,
}

impl RateLimitCoordinator {
    pub fn new(inner: Arc<dyn Transport>, config: &RateLimitConfig, audit: AuditEmitter) -> Self {
        Self {
            inner,
            default_wait: Duration::from_secs(config.default_retry_after_secs),
            max_wait: Duration::from_secs(config.max_retry_after_secs),
            audit,
        }
    }

    /// Wait declared by a `Retry-After` value, clamped to the configured
    /// maximum. Accepts delta-seconds or an HTTP date.
    pub fn retry_after(&self, header: Option<&str>) -> Duration {
        let declared = header.and_then(|value| parse_retry_after(value, Utc::now()));
        declared.unwrap_or(self.default_wait).min(self.max_wait)
    }

    /// Send `request`, honoring at most one provider slow-down per call.
    pub async fn send(
        &self,
        operation: Operation,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, PinError> {
        let response = self.inner.send(request).await?;
        if !response.is_rate_limited() {
            return Ok(response);
        }

        let wait = self.retry_after(response.retry_after.as_deref());
        metrics::record_rate_limited(operation.as_str());
        tracing::warn!(
            operation = %operation,
            method = %request.method,
            path = %request.path,
            wait = ?wait,
            "Provider rate limit hit, waiting before resubmitting"
        );

        let mut details = Details::new();
        details.insert("retryAfter".into(), json!(wait.as_secs_f64()));
        details.insert("endpoint".into(), json!(request.path));
        details.insert("method".into(), json!(request.method.as_str()));
        self.audit.record(
            AuditAction::rate_limit(operation),
            AuditStatus::Failure,
            Severity::Warning,
            details,
        );

        tokio::time::sleep(wait).await;

        let response = self.inner.send(request).await?;
        if response.is_rate_limited() {
            return Err(PinError::RateLimited {
                retry_after: self.retry_after(response.retry_after.as_deref()),
            });
        }
        Ok(response)
    }
}

impl std::fmt::Debug for RateLimitCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitCoordinator")
            .field("default_wait", &self.default_wait)
            .field("max_wait", &self.max_wait)
            .finish()
    }
}

fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if let Ok(secs) = value.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            // Out-of-range values saturate and are clamped by the caller.
            return Some(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX));
        }
        return None;
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?;
    let delta = at.with_timezone(&Utc) - now;
    Some(delta.to_std().unwrap_or(Duration::ZERO))
}
