//! Pinning request/response types and error definitions.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pinning::cid;

/// Why content was rejected before reaching the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    /// JSON content is not an object or array.
    InvalidJson,
    /// Content could not be serialized, e.g. it refers back to itself.
    CircularReference,
    /// Serialized content or file is larger than the configured ceiling.
    SizeLimitExceeded,
    /// File payload is missing.
    InvalidFile,
    /// Content identifier is malformed.
    InvalidHash,
}

impl InvalidReason {
    pub fn code(&self) -> &'static str {
        match self {
            InvalidReason::InvalidJson => "INVALID_JSON",
            InvalidReason::CircularReference => "CIRCULAR_REFERENCE",
            InvalidReason::SizeLimitExceeded => "SIZE_LIMIT_EXCEEDED",
            InvalidReason::InvalidFile => "INVALID_FILE",
            InvalidReason::InvalidHash => "INVALID_HASH",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// What the retry loop should do with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Transient: try again after backoff.
    Retry,
    /// Terminal: surface to the caller now.
    Fail,
}

/// Errors that can occur while talking to the pinning provider.
#[derive(Debug, Error)]
pub enum PinError {
    /// Content, size or hash rejected locally. Never retried.
    #[error("invalid content ({reason}): {message}")]
    InvalidContent {
        reason: InvalidReason,
        message: String,
    },

    /// Provider kept answering 429 after the mandated wait.
    #[error("rate limited by provider (retry after {}s)", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// Provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    /// Connection failure or request timeout.
    #[error("network error: {message}")]
    Network { message: String, timeout: bool },

    /// Provider answered 2xx with a body we cannot accept.
    #[error("unexpected provider response: {0}")]
    Decode(String),

    /// Every attempt failed with a transient error.
    #[error("giving up after {attempts} attempts: {last}")]
    ExhaustedRetries {
        attempts: u32,
        #[source]
        last: Box<PinError>,
    },

    /// Client could not be built from the supplied settings.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl PinError {
    pub fn invalid(reason: InvalidReason, message: impl Into<String>) -> Self {
        PinError::InvalidContent {
            reason,
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        PinError::Provider {
            status,
            message: message.into(),
        }
    }

    /// Terminal vs. retryable, decided once per error kind.
    pub fn disposition(&self) -> Disposition {
        match self {
            PinError::Network { .. } | PinError::RateLimited { .. } => Disposition::Retry,
            PinError::Provider { status, .. } if *status >= 500 || *status == 429 => {
                Disposition::Retry
            }
            PinError::Provider { .. }
            | PinError::InvalidContent { .. }
            | PinError::Decode(_)
            | PinError::ExhaustedRetries { .. }
            | PinError::Config(_) => Disposition::Fail,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.disposition() == Disposition::Retry
    }

    /// Reason code when this is (or wraps) a validation failure.
    pub fn invalid_reason(&self) -> Option<InvalidReason> {
        match self {
            PinError::InvalidContent { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, PinError>;

/// Optional metadata attached to a pin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyvalues: Option<BTreeMap<String, String>>,
}

impl PinMetadata {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            keyvalues: None,
        }
    }

    pub fn with_keyvalue(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.keyvalues
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Content identifier version the provider should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CidVersion {
    V0,
    V1,
}

impl From<CidVersion> for u8 {
    fn from(version: CidVersion) -> Self {
        match version {
            CidVersion::V0 => 0,
            CidVersion::V1 => 1,
        }
    }
}

impl TryFrom<u8> for CidVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CidVersion::V0),
            1 => Ok(CidVersion::V1),
            other => Err(format!("unsupported CID version {}", other)),
        }
    }
}

/// Provider-side pinning options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cid_version: Option<CidVersion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_with_directory: Option<bool>,
}

/// A successful pin. The gateway keeps no copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinResult {
    pub content_id: String,
    pub size: u64,
    pub timestamp: DateTime<Utc>,
}

/// Pin response as the provider sends it.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderPinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
    #[serde(rename = "PinSize")]
    pin_size: u64,
    #[serde(rename = "Timestamp")]
    timestamp: DateTime<Utc>,
}

impl TryFrom<ProviderPinResponse> for PinResult {
    type Error = PinError;

    fn try_from(raw: ProviderPinResponse) -> Result<Self, Self::Error> {
        if !cid::has_content_id_charset(&raw.ipfs_hash) {
            return Err(PinError::Decode(format!(
                "provider returned malformed content identifier '{}'",
                raw.ipfs_hash
            )));
        }
        Ok(PinResult {
            content_id: raw.ipfs_hash,
            size: raw.pin_size,
            timestamp: raw.timestamp,
        })
    }
}

/// Metadata stored alongside a pinned item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PinnedMetadata {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub keyvalues: Option<serde_json::Map<String, serde_json::Value>>,
}

/// One row of the provider's pin list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinnedItem {
    #[serde(default)]
    pub id: Option<String>,

    pub ipfs_pin_hash: String,

    #[serde(default)]
    pub size: u64,

    #[serde(default)]
    pub date_pinned: Option<DateTime<Utc>>,

    #[serde(default)]
    pub date_unpinned: Option<DateTime<Utc>>,

    #[serde(default)]
    pub metadata: PinnedMetadata,
}

/// Pin list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinListResult {
    pub count: u64,

    #[serde(default)]
    pub rows: Vec<PinnedItem>,
}

impl PinListResult {
    pub(crate) fn check(self) -> GatewayResult<Self> {
        if let Some(bad) = self
            .rows
            .iter()
            .find(|row| !cid::has_content_id_charset(&row.ipfs_pin_hash))
        {
            return Err(PinError::Decode(format!(
                "pin list contains malformed content identifier '{}'",
                bad.ipfs_pin_hash
            )));
        }
        Ok(self)
    }
}

/// Pin status filter for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinStatusFilter {
    All,
    Pinned,
    Unpinned,
}

impl PinStatusFilter {
    fn as_str(&self) -> &'static str {
        match self {
            PinStatusFilter::All => "all",
            PinStatusFilter::Pinned => "pinned",
            PinStatusFilter::Unpinned => "unpinned",
        }
    }
}

/// Optional filters for `list_pins_with`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PinListQuery {
    pub status: Option<PinStatusFilter>,
    pub page_limit: Option<u32>,
    pub page_offset: Option<u32>,
    pub name: Option<String>,
}

impl PinListQuery {
    /// Encode as a query string (without the leading `?`), empty when no
    /// filter is set.
    pub fn to_query_string(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(status) = self.status {
            query.append_pair("status", status.as_str());
        }
        if let Some(limit) = self.page_limit {
            query.append_pair("pageLimit", &limit.to_string());
        }
        if let Some(offset) = self.page_offset {
            query.append_pair("pageOffset", &offset.to_string());
        }
        if let Some(name) = &self.name {
            query.append_pair("metadata[name]", name);
        }
        query.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_disposition_by_kind() {
        assert!(PinError::from_status(503, "down").is_retryable());
        assert!(PinError::from_status(429, "slow").is_retryable());
        assert!(!PinError::from_status(401, "nope").is_retryable());
        assert!(!PinError::from_status(404, "gone").is_retryable());
        assert!(PinError::Network { message: "reset".into(), timeout: true }.is_retryable());
        assert!(!PinError::invalid(InvalidReason::InvalidHash, "bad").is_retryable());
        assert!(!PinError::Decode("x".into()).is_retryable());
    }

    #[test]
    fn test_invalid_content_display_carries_code() {
        let err = PinError::invalid(InvalidReason::SizeLimitExceeded, "too big");
        assert_eq!(err.to_string(), "invalid content (SIZE_LIMIT_EXCEEDED): too big");
        assert_eq!(err.invalid_reason(), Some(InvalidReason::SizeLimitExceeded));
    }

    #[test]
    fn test_options_wire_shape() {
        let options = PinOptions {
            cid_version: Some(CidVersion::V1),
            wrap_with_directory: Some(false),
        };
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({"cidVersion": 1, "wrapWithDirectory": false})
        );
        assert_eq!(serde_json::to_value(PinOptions::default()).unwrap(), json!({}));
        assert!(serde_json::from_value::<PinOptions>(json!({"cidVersion": 2})).is_err());
    }

    #[test]
    fn test_metadata_wire_shape() {
        let metadata = PinMetadata::named("report").with_keyvalue("env", "prod");
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            json!({"name": "report", "keyvalues": {"env": "prod"}})
        );
    }

    #[test]
    fn test_provider_response_decodes() {
        let raw: ProviderPinResponse = serde_json::from_value(json!({
            "IpfsHash": "QmABC123",
            "PinSize": 10,
            "Timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let result = PinResult::try_from(raw).unwrap();
        assert_eq!(result.content_id, "QmABC123");
        assert_eq!(result.size, 10);
        assert_eq!(result.timestamp.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_provider_response_rejects_bad_identifier() {
        let raw: ProviderPinResponse = serde_json::from_value(json!({
            "IpfsHash": "../etc",
            "PinSize": 1,
            "Timestamp": "2024-01-01T00:00:00.000Z"
        }))
        .unwrap();
        assert!(matches!(PinResult::try_from(raw), Err(PinError::Decode(_))));
    }

    #[test]
    fn test_pin_list_decodes_provider_rows() {
        let list: PinListResult = serde_json::from_value(json!({
            "count": 1,
            "rows": [{
                "id": "1",
                "ipfs_pin_hash": "QmTest123456789",
                "size": 1000,
                "date_pinned": "2024-02-03T04:05:06.789Z",
                "date_unpinned": null,
                "metadata": {"name": "Test Pin 1", "keyvalues": {"key1": "value1"}}
            }]
        }))
        .unwrap();
        let list = list.check().unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.rows[0].metadata.name.as_deref(), Some("Test Pin 1"));
        assert!(list.rows[0].date_unpinned.is_none());
    }

    #[test]
    fn test_list_query_string() {
        assert_eq!(PinListQuery::default().to_query_string(), "");
        let query = PinListQuery {
            status: Some(PinStatusFilter::Pinned),
            page_limit: Some(10),
            page_offset: None,
            name: Some("a b".into()),
        };
        assert_eq!(
            query.to_query_string(),
            "status=pinned&pageLimit=10&metadata%5Bname%5D=a+b"
        );
    }
}
