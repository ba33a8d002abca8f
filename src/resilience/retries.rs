//! Retry logic.
//!
//! # Responsibilities
//! - Run an operation up to `max_attempts` times, strictly sequentially
//! - Retry only failures tagged `Disposition::Retry`
//! - Sleep the backoff schedule between attempts
//! - Record exactly one audit event per attempt
//!
//! # Design Decisions
//! - Terminal failures surface on first occurrence
//! - Retryable failures surface as `ExhaustedRetries` once the budget is spent
//! - Rate-limit resubmissions happen below this loop and are not counted

use std::future::Future;

use serde_json::json;

use crate::audit::{AuditAction, AuditEmitter, AuditStatus, Details, Operation, Severity};
use crate::config::RetryConfig;
use crate::observability::metrics;
use crate::pinning::types::{Disposition, PinError};
use crate::resilience::backoff::BackoffPolicy;

/// Default attempt budget per operation.
pub const MAX_RETRIES: u32 = 3;

/// Default base delay for the backoff schedule.
pub const BASE_DELAY_MS: u64 = 1000;

/// Results that can describe themselves in a success audit event.
pub trait AuditSummary {
    fn audit_details(&self) -> Details {
        Details::new()
    }
}

impl AuditSummary for () {}

/// Operation identity plus details shared by every attempt's event.
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub operation: Operation,
    pub details: Details,
}

impl AttemptContext {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            details: Details::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: serde_json::Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }
}

/// Bounded retry with exponential backoff and per-attempt auditing.
#[derive(Debug, Clone)]
pub struct BackoffController {
    max_attempts: u32,
    backoff: BackoffPolicy,
    audit: AuditEmitter,
}

impl BackoffController {
    pub fn new(config: &RetryConfig, audit: AuditEmitter) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: BackoffPolicy::from_config(config),
            audit,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds, fails terminally, or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, ctx: &AttemptContext, mut op: F) -> Result<T, PinError>
    where
        T: AuditSummary,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, PinError>>,
    {
        let operation = ctx.operation;
        let mut attempt = 1;

        loop {
            let mut details = ctx.details.clone();
            details.insert("attempt".into(), json!(attempt));

            match op(attempt).await {
                Ok(value) => {
                    details.extend(value.audit_details());
                    metrics::record_attempt(operation.as_str(), true);
                    self.audit.record(
                        AuditAction::attempt(operation),
                        AuditStatus::Success,
                        Severity::Info,
                        details,
                    );
                    return Ok(value);
                }
                Err(err) => {
                    metrics::record_attempt(operation.as_str(), false);
                    let disposition = err.disposition();
                    details.insert("error".into(), json!(err.to_string()));
                    details.insert(
                        "retryable".into(),
                        json!(disposition == Disposition::Retry),
                    );

                    if disposition == Disposition::Retry && attempt < self.max_attempts {
                        self.audit.record(
                            AuditAction::retry(operation),
                            AuditStatus::Failure,
                            Severity::Warning,
                            details,
                        );
                        let delay = self.backoff.delay_before(attempt + 1);
                        tracing::info!(
                            operation = %operation,
                            attempt,
                            delay = ?delay,
                            error = %err,
                            "Retrying provider request"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    self.audit.record(
                        AuditAction::attempt(operation),
                        AuditStatus::Failure,
                        Severity::High,
                        details,
                    );

                    return match disposition {
                        Disposition::Retry => {
                            tracing::error!(
                                operation = %operation,
                                attempts = attempt,
                                error = %err,
                                "Retries exhausted"
                            );
                            Err(PinError::ExhaustedRetries {
                                attempts: attempt,
                                last: Box::new(err),
                            })
                        }
                        Disposition::Fail => {
                            tracing::warn!(
                                operation = %operation,
                                attempt,
                                error = %err,
                                "Terminal provider failure"
                            );
                            Err(err)
                        }
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::time::Instant;

    fn controller() -> (BackoffController, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let controller = BackoffController::new(&RetryConfig::default(), AuditEmitter::new(sink.clone()));
        (controller, sink)
    }

    fn transient() -> PinError {
        PinError::Network {
            message: "connection reset".into(),
            timeout: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures_with_doubling_delays() {
        let (controller, sink) = controller();
        let started = Instant::now();
        let starts = Arc::new(Mutex::new(Vec::new()));

        let seen = starts.clone();
        let result = controller
            .run(&AttemptContext::new(Operation::Unpin), move |attempt| {
                seen.lock().unwrap().push(started.elapsed());
                async move {
                    if attempt < 3 {
                        Err(transient())
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        let starts = starts.lock().unwrap().clone();
        assert_eq!(
            starts,
            vec![Duration::ZERO, Duration::from_millis(1000), Duration::from_millis(3000)]
        );

        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].action.to_string(), "UNPIN_RETRY");
        assert_eq!(events[1].action.to_string(), "UNPIN_RETRY");
        assert_eq!(events[2].action.to_string(), "UNPIN");
        assert_eq!(events[2].status, AuditStatus::Success);
        assert_eq!(events[2].details["attempt"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let (controller, sink) = controller();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = controller
            .run(&AttemptContext::new(Operation::List), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        match result {
            Err(PinError::ExhaustedRetries { attempts, last }) => {
                assert_eq!(attempts, MAX_RETRIES);
                assert!(matches!(*last, PinError::Network { .. }));
            }
            other => panic!("expected exhausted retries, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES);

        let events = sink.events();
        assert_eq!(events.len(), MAX_RETRIES as usize);
        assert!(events.iter().all(|e| e.status == AuditStatus::Failure));
        assert_eq!(events[2].severity, Severity::High);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_is_not_retried() {
        let (controller, sink) = controller();
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), _> = controller
            .run(&AttemptContext::new(Operation::PinJson), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(PinError::from_status(401, "bad credentials")) }
            })
            .await;

        assert!(matches!(result, Err(PinError::Provider { status: 401, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action.to_string(), "PIN_JSON");
        assert_eq!(events[0].details["retryable"], false);
    }

    #[tokio::test]
    async fn test_context_details_carried_on_every_event() {
        let (controller, sink) = controller();
        let ctx = AttemptContext::new(Operation::Unpin).with_detail("hash", json!("QmX"));

        controller.run(&ctx, |_| async { Ok(()) }).await.unwrap();

        assert_eq!(sink.events()[0].details["hash"], "QmX");
    }
}
