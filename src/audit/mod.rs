//! Audit trail subsystem.
//!
//! # Data Flow
//! ```text
//! retry loop / rate-limit coordinator / gateway
//!     → emitter.rs (build AuditEvent, one per attempt)
//!     → sink.rs (JSON-lines file, tracing, or memory)
//!     → notifier.rs (webhook, high severity only, spawned)
//! ```
//!
//! # Design Decisions
//! - Recording is synchronous; notification is never awaited
//! - Nothing in this module returns an error to the operation being audited

pub mod emitter;
pub mod event;
pub mod notifier;
pub mod sink;

pub use emitter::AuditEmitter;
pub use event::{AuditAction, AuditEvent, AuditStatus, Details, Operation, Severity, Step};
pub use notifier::WebhookNotifier;
pub use sink::{AuditSink, JsonLinesSink, MemorySink, TracingSink};
