//! Audit emitter: one entry point for every recorded attempt.

use std::sync::Arc;

use crate::audit::event::{AuditAction, AuditEvent, AuditStatus, Details, Severity};
use crate::audit::notifier::WebhookNotifier;
use crate::audit::sink::{AuditSink, JsonLinesSink, TracingSink};
use crate::config::AuditConfig;
use crate::observability::metrics;

struct Inner {
    sink: Arc<dyn AuditSink>,
    notifier: Option<WebhookNotifier>,
    notify_min: Severity,
}

/// Cheap to clone; all clones share the same sink.
#[derive(Clone)]
pub struct AuditEmitter {
    inner: Arc<Inner>,
}

impl AuditEmitter {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                notifier: None,
                notify_min: Severity::High,
            }),
        }
    }

    /// Attach a webhook for events at or above `min_severity`.
    pub fn with_notifier(self, notifier: WebhookNotifier, min_severity: Severity) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink: self.inner.sink.clone(),
                notifier: Some(notifier),
                notify_min: min_severity,
            }),
        }
    }

    /// Build from configuration: JSON-lines file when a path is set,
    /// tracing otherwise; webhook when a URL is set.
    pub fn from_config(config: &AuditConfig) -> std::io::Result<Self> {
        let sink: Arc<dyn AuditSink> = match &config.log_path {
            Some(path) => Arc::new(JsonLinesSink::new(
                path,
                config.max_file_bytes,
                config.max_files,
            )?),
            None => Arc::new(TracingSink),
        };
        let emitter = Self::new(sink);

        match &config.webhook_url {
            Some(url) => {
                let notifier = WebhookNotifier::new(url.clone(), config.webhook_channel.clone())
                    .map_err(std::io::Error::other)?;
                Ok(emitter.with_notifier(notifier, config.notify_min_severity))
            }
            None => Ok(emitter),
        }
    }

    /// Append one event. Sink and notification failures are logged here
    /// and never reach the caller.
    pub fn record(
        &self,
        action: AuditAction,
        status: AuditStatus,
        severity: Severity,
        details: Details,
    ) {
        let event = AuditEvent::new(action, status, severity, details);

        if let Err(e) = self.inner.sink.record(&event) {
            metrics::record_audit_failure("sink");
            tracing::error!(
                id = %event.id,
                action = %event.action,
                error = %e,
                "Failed to record audit event"
            );
        }

        if severity >= self.inner.notify_min {
            if let Some(notifier) = &self.inner.notifier {
                notifier.notify(&event);
            }
        }
    }
}

impl std::fmt::Debug for AuditEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditEmitter")
            .field("notifier", &self.inner.notifier.is_some())
            .field("notify_min", &self.inner.notify_min)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::event::Operation;
    use crate::audit::sink::MemorySink;
    use std::io;

    struct BrokenSink;

    impl AuditSink for BrokenSink {
        fn record(&self, _event: &AuditEvent) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_record_reaches_sink() {
        let sink = Arc::new(MemorySink::new());
        let emitter = AuditEmitter::new(sink.clone());
        emitter.record(
            AuditAction::attempt(Operation::PinJson),
            AuditStatus::Success,
            Severity::Info,
            Details::new(),
        );
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].action.to_string(), "PIN_JSON");
    }

    #[test]
    fn test_sink_failure_is_swallowed() {
        let emitter = AuditEmitter::new(Arc::new(BrokenSink));
        emitter.record(
            AuditAction::retry(Operation::List),
            AuditStatus::Failure,
            Severity::Warning,
            Details::new(),
        );
    }

    #[tokio::test]
    async fn test_unreachable_webhook_does_not_affect_caller() {
        let sink = Arc::new(MemorySink::new());
        let notifier = WebhookNotifier::new("http://127.0.0.1:1/hook", None).unwrap();
        let emitter = AuditEmitter::new(sink.clone()).with_notifier(notifier, Severity::Warning);
        emitter.record(
            AuditAction::attempt(Operation::Unpin),
            AuditStatus::Failure,
            Severity::High,
            Details::new(),
        );
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_from_config_uses_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let config = AuditConfig {
            log_path: Some(path.to_string_lossy().into_owned()),
            ..AuditConfig::default()
        };
        let emitter = AuditEmitter::from_config(&config).unwrap();
        emitter.record(
            AuditAction::attempt(Operation::TestConnection),
            AuditStatus::Success,
            Severity::Info,
            Details::new(),
        );
        assert!(std::fs::read_to_string(path).unwrap().contains("TEST_CONNECTION"));
    }
}
