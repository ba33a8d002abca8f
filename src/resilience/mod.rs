//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway operation:
//!     → retries.rs (bounded attempts, one audit event each)
//!     → backoff.rs (exponential delay between attempts)
//!     → rate_limit.rs (429 wait and single resubmission, not a retry)
//!     → transport
//! ```
//!
//! # Design Decisions
//! - Attempts for one operation are strictly sequential
//! - Only failures classified as transient are retried
//! - Total submissions per operation are bounded even under repeated 429s

pub mod backoff;
pub mod rate_limit;
pub mod retries;

pub use backoff::BackoffPolicy;
pub use rate_limit::RateLimitCoordinator;
pub use retries::{AttemptContext, AuditSummary, BackoffController};
