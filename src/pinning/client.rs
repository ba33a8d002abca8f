//! HTTP client for the pinning provider.
//!
//! # Responsibilities
//! - Hold credentials and base URL, fixed at construction
//! - Attach auth headers and the User-Agent to every request
//! - Enforce the per-request timeout
//! - Map transport failures to retryable `PinError::Network`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, RETRY_AFTER};
use reqwest::multipart::{Form, Part};

use crate::config::ProviderConfig;
use crate::pinning::transport::{ProviderRequest, ProviderResponse, RequestBody, Transport};
use crate::pinning::types::PinError;

const API_KEY_HEADER: &str = "pinata_api_key";
const API_SECRET_HEADER: &str = "pinata_secret_api_key";

/// Explicit provider client. Build once and share by `Arc`.
#[derive(Clone)]
pub struct ProviderClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl ProviderClient {
    /// Create a new provider client.
    ///
    /// # Arguments
    /// * `config` - Provider endpoint, credentials and timeout
    ///
    /// # Returns
    /// A new client or `PinError::Config` when a header or URL is unusable
    pub fn new(config: &ProviderConfig) -> Result<Self, PinError> {
        let base: url::Url = config.base_url.parse().map_err(|e| {
            PinError::Config(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            secret_header(&config.api_key, "API key")?,
        );
        headers.insert(
            HeaderName::from_static(API_SECRET_HEADER),
            secret_header(&config.api_secret, "API secret")?,
        );
        headers.insert(
            AUTHORIZATION,
            secret_header(&format!("Bearer {}", config.jwt), "JWT")?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| PinError::Config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::info!(
            base_url = %base,
            timeout_secs = config.timeout_secs,
            "Provider client initialized"
        );

        Ok(Self {
            http,
            base_url: base.as_str().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build(&self, request: &ProviderRequest) -> Result<reqwest::RequestBuilder, PinError> {
        let url = format!("{}{}", self.base_url, request.path);
        let builder = self.http.request(request.method.clone(), url);

        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(upload) => {
                let len = upload.bytes.len() as u64;
                let file = Part::stream_with_length(upload.bytes.clone(), len)
                    .file_name(upload.file_name.clone())
                    .mime_str("application/octet-stream")
                    .map_err(|e| PinError::Config(format!("Invalid file part: {}", e)))?;
                let mut form = Form::new().part("file", file);
                if let Some(metadata) = &upload.metadata {
                    form = form.text("pinataMetadata", metadata.clone());
                }
                if let Some(options) = &upload.options {
                    form = form.text("pinataOptions", options.clone());
                }
                builder.multipart(form)
            }
        };
        Ok(builder)
    }
}

#[async_trait]
impl Transport for ProviderClient {
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, PinError> {
        let response = self.build(request)?.send().await.map_err(network_error)?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await.map_err(network_error)?.to_vec();

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            bytes = body.len(),
            "Provider responded"
        );

        Ok(ProviderResponse {
            status,
            retry_after,
            body,
        })
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout.as_secs())
            .finish()
    }
}

fn secret_header(value: &str, what: &str) -> Result<HeaderValue, PinError> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| PinError::Config(format!("{} contains invalid header characters", what)))?;
    header.set_sensitive(true);
    Ok(header)
}

fn network_error(e: reqwest::Error) -> PinError {
    PinError::Network {
        message: e.to_string(),
        timeout: e.is_timeout(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ProviderConfig {
        ProviderConfig {
            base_url: "http://127.0.0.1:1/".to_string(),
            api_key: "key".to_string(),
            api_secret: "secret".to_string(),
            jwt: "jwt".to_string(),
            timeout_secs: 2,
            user_agent: "pin-gateway-test".to_string(),
        }
    }

    #[test]
    fn test_client_creation_normalizes_base_url() {
        let client = ProviderClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:1");
        assert_eq!(client.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_bad_url_and_header_values() {
        let mut config = test_config();
        config.base_url = "not a url".into();
        assert!(matches!(ProviderClient::new(&config), Err(PinError::Config(_))));

        let mut config = test_config();
        config.api_key = "line\nbreak".into();
        let err = ProviderClient::new(&config).unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_debug_omits_credentials() {
        let rendered = format!("{:?}", ProviderClient::new(&test_config()).unwrap());
        assert!(!rendered.contains("secret"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_retryable_network_error() {
        let client = ProviderClient::new(&test_config()).unwrap();
        let err = client
            .send(&ProviderRequest::get("/data/testAuthentication"))
            .await
            .unwrap_err();
        assert!(matches!(err, PinError::Network { timeout: false, .. }));
        assert!(err.is_retryable());
    }
}
