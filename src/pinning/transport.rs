//! Provider request/response model and the transport seam.
//!
//! Requests are plain values so the rate-limit path can resubmit exactly
//! what was sent the first time.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::pinning::types::PinError;

/// Longest provider message kept in an error.
const MAX_ERROR_MESSAGE_LEN: usize = 512;

/// A file part plus the optional JSON text parts sent with it.
#[derive(Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub file_name: String,
    /// Shared payload; clones for resubmission do not copy it.
    pub bytes: Bytes,
    /// `pinataMetadata` part, already JSON-encoded.
    pub metadata: Option<String>,
    /// `pinataOptions` part, already JSON-encoded.
    pub options: Option<String>,
}

impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .field("metadata", &self.metadata)
            .field("options", &self.options)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(FileUpload),
}

/// One HTTP exchange with the provider, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub method: Method,
    /// Path and query, starting with `/`.
    pub path: String,
    pub body: RequestBody,
}

impl ProviderRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Json(body),
        }
    }

    pub fn post_multipart(path: impl Into<String>, upload: FileUpload) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: RequestBody::Multipart(upload),
        }
    }
}

/// Raw provider response. Any HTTP status is a response, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderResponse {
    pub status: u16,
    /// Raw `Retry-After` header value, if any.
    pub retry_after: Option<String>,
    pub body: Vec<u8>,
}

impl ProviderResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, value: impl Into<String>) -> Self {
        self.retry_after = Some(value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Decode the body against an explicit schema.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, PinError> {
        serde_json::from_slice(&self.body).map_err(|e| PinError::Decode(e.to_string()))
    }

    /// Best-effort human message from an error body.
    ///
    /// Understands `{"message": ..}`, `{"error": "..."}` and
    /// `{"error": {"reason": .., "details": ..}}`; falls back to the text.
    pub fn error_message(&self) -> String {
        let message = match serde_json::from_slice::<Value>(&self.body) {
            Ok(value) => message_from_json(&value),
            Err(_) => None,
        }
        .unwrap_or_else(|| String::from_utf8_lossy(&self.body).trim().to_string());

        let message = if message.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            message
        };
        clip(message)
    }
}

fn message_from_json(value: &Value) -> Option<String> {
    if let Some(message) = value.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    match value.get("error")? {
        Value::String(error) => Some(error.clone()),
        Value::Object(error) => {
            let reason = error.get("reason").and_then(Value::as_str);
            let details = error.get("details").and_then(Value::as_str);
            match (reason, details) {
                (Some(r), Some(d)) => Some(format!("{}: {}", r, d)),
                (Some(r), None) => Some(r.to_string()),
                (None, Some(d)) => Some(d.to_string()),
                (None, None) => None,
            }
        }
        _ => None,
    }
}

fn clip(mut message: String) -> String {
    if message.len() > MAX_ERROR_MESSAGE_LEN {
        let mut cut = MAX_ERROR_MESSAGE_LEN;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push('…');
    }
    message
}

/// Sends provider requests. Implemented over HTTP by `ProviderClient`.
///
/// Implementations return `Err` only for failures where no response was
/// received (connection errors, timeouts).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderResponse, PinError>;
}
