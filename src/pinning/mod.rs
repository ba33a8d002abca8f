//! Pinning subsystem.
//!
//! # Data Flow
//! ```text
//! caller
//!     → gateway.rs (operation entry points)
//!     → validator.rs + cid.rs (local checks, no network)
//!     → resilience (retry loop, rate-limit coordinator)
//!     → transport.rs (request/response values, Transport seam)
//!     → client.rs (reqwest over HTTPS to the provider)
//! ```

pub mod cid;
pub mod client;
pub mod gateway;
pub mod transport;
pub mod types;
pub mod validator;

pub use client::ProviderClient;
pub use gateway::PinningGateway;
pub use transport::{FileUpload, ProviderRequest, ProviderResponse, RequestBody, Transport};
pub use types::{
    CidVersion, Disposition, GatewayResult, InvalidReason, PinError, PinListQuery, PinListResult,
    PinMetadata, PinOptions, PinResult, PinStatusFilter, PinnedItem, PinnedMetadata,
};
pub use validator::Validator;
