//! Shared utilities for gateway integration tests.

use std::sync::Arc;

use serde_json::json;
use wiremock::{MockServer, Request, ResponseTemplate};

use pin_gateway::audit::{AuditEmitter, MemorySink};
use pin_gateway::config::GatewayConfig;
use pin_gateway::pinning::{PinningGateway, ProviderClient};

pub const API_KEY: &str = "test-key";
pub const API_SECRET: &str = "test-secret";
pub const JWT: &str = "test-jwt";

/// Well-formed CIDv0.
pub const VALID_HASH: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

/// Gateway wired to a stub provider and an in-memory audit trail.
pub struct Harness {
    pub server: MockServer,
    pub gateway: PinningGateway,
    pub sink: Arc<MemorySink>,
}

/// Configuration pointing at `base_url` with short backoff delays.
pub fn test_config(base_url: &str) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.provider.base_url = base_url.to_string();
    config.provider.api_key = API_KEY.to_string();
    config.provider.api_secret = API_SECRET.to_string();
    config.provider.jwt = JWT.to_string();
    config.provider.timeout_secs = 5;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 100;
    config
}

pub fn gateway_for(config: &GatewayConfig, audit: AuditEmitter) -> PinningGateway {
    let client = ProviderClient::new(&config.provider).expect("client builds");
    PinningGateway::new(Arc::new(client), config, audit)
}

/// Start a stub provider and a gateway in front of it.
pub async fn harness() -> Harness {
    harness_with(|_| {}).await
}

pub async fn harness_with<F>(tweak: F) -> Harness
where
    F: FnOnce(&mut GatewayConfig),
{
    let server = MockServer::start().await;
    let mut config = test_config(&server.uri());
    tweak(&mut config);

    let sink = Arc::new(MemorySink::new());
    let gateway = gateway_for(&config, AuditEmitter::new(sink.clone()));
    Harness {
        server,
        gateway,
        sink,
    }
}

/// Successful pin response in the provider's wire shape.
pub fn pinned(hash: &str, size: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "IpfsHash": hash,
        "PinSize": size,
        "Timestamp": "2024-01-01T00:00:00Z"
    }))
}

pub async fn received(server: &MockServer) -> Vec<Request> {
    server.received_requests().await.unwrap_or_default()
}
