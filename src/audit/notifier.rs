//! Best-effort webhook notification for high-severity audit events.

use std::time::Duration;

use serde_json::{json, Value};

use crate::audit::event::AuditEvent;
use crate::observability::metrics;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts audit events to a webhook (Slack-compatible payload).
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    channel: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, channel: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(NOTIFY_TIMEOUT).build()?;
        Ok(Self {
            client,
            url: url.into(),
            channel,
        })
    }

    pub fn payload(&self, event: &AuditEvent) -> Value {
        let details = Value::Object(event.details.clone());
        let mut payload = json!({
            "action": event.action,
            "status": event.status,
            "details": details,
            "timestamp": event.timestamp,
            "text": format!(
                "IPFS Security Event: {}\nStatus: {}\nDetails: {}",
                event.action, event.status, details
            ),
        });
        if let Some(channel) = &self.channel {
            payload["channel"] = Value::String(channel.clone());
        }
        payload
    }

    /// Fire and forget. The caller never waits on, or learns about, the
    /// outcome; failures are only logged.
    pub fn notify(&self, event: &AuditEvent) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!(action = %event.action, "No async runtime, skipping audit notification");
                return;
            }
        };

        let client = self.client.clone();
        let url = self.url.clone();
        let payload = self.payload(event);
        let action = event.action.to_string();

        handle.spawn(async move {
            match client.post(&url).json(&payload).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!(action = %action, "Audit notification delivered");
                }
                Ok(response) => {
                    metrics::record_audit_failure("notify");
                    tracing::warn!(
                        action = %action,
                        status = %response.status(),
                        "Audit notification rejected"
                    );
                }
                Err(e) => {
                    metrics::record_audit_failure("notify");
                    tracing::warn!(action = %action, error = %e, "Failed to send audit notification");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::event::{AuditAction, AuditStatus, Details, Operation, Severity};

    #[test]
    fn test_payload_shape() {
        let notifier =
            WebhookNotifier::new("http://127.0.0.1:1/hook", Some("#security".into())).unwrap();
        let mut details = Details::new();
        details.insert("hash".into(), json!("QmX"));
        let event = AuditEvent::new(
            AuditAction::attempt(Operation::Unpin),
            AuditStatus::Failure,
            Severity::High,
            details,
        );

        let payload = notifier.payload(&event);
        assert_eq!(payload["action"], "UNPIN");
        assert_eq!(payload["status"], "failure");
        assert_eq!(payload["details"]["hash"], "QmX");
        assert_eq!(payload["channel"], "#security");
        assert!(payload["text"].as_str().unwrap().contains("IPFS Security Event: UNPIN"));
    }

    #[test]
    fn test_notify_without_runtime_is_silent() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:1/hook", None).unwrap();
        let event = AuditEvent::new(
            AuditAction::attempt(Operation::List),
            AuditStatus::Failure,
            Severity::High,
            Details::new(),
        );
        notifier.notify(&event);
    }
}
