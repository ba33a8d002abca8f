//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (PINATA_*, SLACK_*)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → read once when the provider client and gateway are built
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AuditConfig;
pub use schema::GatewayConfig;
pub use schema::LimitsConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::ProviderConfig;
pub use schema::RateLimitConfig;
pub use schema::RetryConfig;
