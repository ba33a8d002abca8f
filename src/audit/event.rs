//! Audit event model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form structured details attached to an event.
pub type Details = Map<String, Value>;

/// Gateway operation an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PinJson,
    PinFile,
    List,
    Unpin,
    TestConnection,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::PinJson => "PIN_JSON",
            Operation::PinFile => "PIN_FILE",
            Operation::List => "LIST",
            Operation::Unpin => "UNPIN",
            Operation::TestConnection => "TEST_CONNECTION",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of step within the operation was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Attempt that ended the operation (success, terminal or last failure).
    Final,
    /// Failed attempt that will be retried.
    Retry,
    /// Provider 429 answered with a wait and resubmission.
    RateLimit,
}

/// Action label, rendered as `PIN_JSON`, `PIN_JSON_RETRY`, `PIN_JSON_RATE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuditAction {
    pub operation: Operation,
    pub step: Step,
}

impl AuditAction {
    pub fn attempt(operation: Operation) -> Self {
        Self {
            operation,
            step: Step::Final,
        }
    }

    pub fn retry(operation: Operation) -> Self {
        Self {
            operation,
            step: Step::Retry,
        }
    }

    pub fn rate_limit(operation: Operation) -> Self {
        Self {
            operation,
            step: Step::RateLimit,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.step {
            Step::Final => write!(f, "{}", self.operation),
            Step::Retry => write!(f, "{}_RETRY", self.operation),
            Step::RateLimit => write!(f, "{}_RATE_LIMIT", self.operation),
        }
    }
}

impl Serialize for AuditAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStatus::Success => f.write_str("success"),
            AuditStatus::Failure => f.write_str("failure"),
        }
    }
}

/// Ordered so that `severity >= threshold` selects notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    High,
}

/// Immutable record of one attempted operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub action: AuditAction,
    pub status: AuditStatus,
    pub severity: Severity,
    pub details: Details,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: AuditAction, status: AuditStatus, severity: Severity, details: Details) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            status,
            severity,
            details,
            timestamp: Utc::now(),
        }
    }
}
