//! Resilient content-pinning gateway.

pub mod audit;
pub mod config;
pub mod observability;
pub mod pinning;
pub mod resilience;

pub use audit::AuditEmitter;
pub use config::GatewayConfig;
pub use pinning::{PinError, PinningGateway};
