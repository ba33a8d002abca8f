//! Pinning gateway: the single entry point for provider operations.
//!
//! # Responsibilities
//! - Validate content, sizes and hashes before any request is built
//! - Run each provider call through the retry loop and rate-limit coordinator
//! - Decode provider responses into typed results at the boundary
//! - Record operation metrics
//!
//! # Design Decisions
//! - The gateway holds no mutable state and is shared by `Arc`
//! - `test_connection` is a probe: every failure becomes `false`

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use serde::Serialize;
use serde_json::{json, Value};

use crate::audit::{AuditAction, AuditEmitter, AuditStatus, Details, Operation, Severity};
use crate::config::GatewayConfig;
use crate::observability::metrics;
use crate::pinning::client::ProviderClient;
use crate::pinning::transport::{FileUpload, ProviderRequest, ProviderResponse, Transport};
use crate::pinning::types::{
    GatewayResult, PinError, PinListQuery, PinListResult, PinMetadata, PinOptions, PinResult,
    ProviderPinResponse,
};
use crate::pinning::validator::Validator;
use crate::resilience::{AttemptContext, AuditSummary, BackoffController, RateLimitCoordinator};

const PIN_JSON_PATH: &str = "/pinning/pinJSONToIPFS";
const PIN_FILE_PATH: &str = "/pinning/pinFileToIPFS";
const PIN_LIST_PATH: &str = "/pinning/pinList";
const UNPIN_PATH: &str = "/pinning/unpin";
const TEST_AUTH_PATH: &str = "/data/testAuthentication";

/// Name given to JSON pins submitted without metadata.
pub const DEFAULT_PIN_NAME: &str = "Untitled";

/// File name used for uploads without a metadata name.
pub const DEFAULT_FILE_NAME: &str = "file";

impl AuditSummary for PinResult {
    fn audit_details(&self) -> Details {
        let mut details = Details::new();
        details.insert("ipfsHash".into(), json!(self.content_id));
        details.insert("size".into(), json!(self.size));
        details
    }
}

impl AuditSummary for PinListResult {
    fn audit_details(&self) -> Details {
        let mut details = Details::new();
        details.insert("count".into(), json!(self.count));
        details.insert("rows".into(), json!(self.rows.len()));
        details
    }
}

/// Resilient front for a content-pinning provider.
#[derive(Debug)]
pub struct PinningGateway {
    transport: RateLimitCoordinator,
    validator: Validator,
    retries: BackoffController,
    audit: AuditEmitter,
}

impl PinningGateway {
    /// Assemble a gateway over an explicit transport.
    pub fn new(client: Arc<dyn Transport>, config: &GatewayConfig, audit: AuditEmitter) -> Self {
        Self {
            transport: RateLimitCoordinator::new(client, &config.rate_limit, audit.clone()),
            validator: Validator::new(config.limits.max_content_bytes),
            retries: BackoffController::new(&config.retries, audit.clone()),
            audit,
        }
    }

    /// Build the HTTP client and audit trail described by `config`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, PinError> {
        let client = ProviderClient::new(&config.provider)?;
        let audit = AuditEmitter::from_config(&config.audit)
            .map_err(|e| PinError::Config(format!("Failed to open audit sink: {}", e)))?;
        Ok(Self::new(Arc::new(client), config, audit))
    }

    pub fn audit(&self) -> &AuditEmitter {
        &self.audit
    }

    /// Pin a JSON object or array.
    pub async fn pin_json<T>(
        &self,
        content: &T,
        metadata: Option<&PinMetadata>,
        options: Option<&PinOptions>,
    ) -> GatewayResult<PinResult>
    where
        T: Serialize + ?Sized,
    {
        let operation = Operation::PinJson;
        observed(operation, async {
            let (content, size) = self
                .validator
                .validate_json(content)
                .map_err(|e| self.rejected(operation, e))?;
            metrics::record_upload_size(size);

            let metadata = metadata
                .cloned()
                .unwrap_or_else(|| PinMetadata::named(DEFAULT_PIN_NAME));
            let options = options.cloned().unwrap_or_default();
            let request = ProviderRequest::post_json(
                PIN_JSON_PATH,
                json!({
                    "pinataContent": content,
                    "pinataMetadata": metadata,
                    "pinataOptions": options,
                }),
            );

            let ctx = AttemptContext::new(operation)
                .with_detail("contentSize", json!(size))
                .with_detail("metadata", json!(metadata))
                .with_detail("options", json!(options));

            let request = &request;
            self.retries
                .run(&ctx, |_| async move {
                    let response = self.dispatch(operation, request).await?;
                    PinResult::try_from(response.json::<ProviderPinResponse>()?)
                })
                .await
        })
        .await
    }

    /// Pin a binary payload. `None` is rejected; an empty slice is pinned.
    pub async fn pin_file(
        &self,
        file: Option<&[u8]>,
        metadata: Option<&PinMetadata>,
        options: Option<&PinOptions>,
    ) -> GatewayResult<PinResult> {
        let operation = Operation::PinFile;
        observed(operation, async {
            let bytes = self
                .validator
                .validate_file(file)
                .map_err(|e| self.rejected(operation, e))?;
            metrics::record_upload_size(bytes.len());

            let file_name = metadata
                .and_then(|m| m.name.clone())
                .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
            let upload = FileUpload {
                file_name,
                bytes: Bytes::copy_from_slice(bytes),
                metadata: metadata.map(|m| json!(m).to_string()),
                options: options.map(|o| json!(o).to_string()),
            };
            let request = ProviderRequest::post_multipart(PIN_FILE_PATH, upload);

            let ctx = AttemptContext::new(operation)
                .with_detail("fileSize", json!(bytes.len()))
                .with_detail("metadata", json!(metadata))
                .with_detail("options", json!(options));

            let request = &request;
            self.retries
                .run(&ctx, |_| async move {
                    let response = self.dispatch(operation, request).await?;
                    PinResult::try_from(response.json::<ProviderPinResponse>()?)
                })
                .await
        })
        .await
    }

    /// First page of pinned items with the provider's default filters.
    pub async fn list_pins(&self) -> GatewayResult<PinListResult> {
        self.list_pins_with(&PinListQuery::default()).await
    }

    /// Pinned items matching `query`.
    pub async fn list_pins_with(&self, query: &PinListQuery) -> GatewayResult<PinListResult> {
        let operation = Operation::List;
        observed(operation, async {
            let query_string = query.to_query_string();
            let path = if query_string.is_empty() {
                PIN_LIST_PATH.to_string()
            } else {
                format!("{}?{}", PIN_LIST_PATH, query_string)
            };
            let request = ProviderRequest::get(path);

            let mut ctx = AttemptContext::new(operation);
            if !query_string.is_empty() {
                ctx = ctx.with_detail("query", json!(query_string));
            }

            let request = &request;
            self.retries
                .run(&ctx, |_| async move {
                    let response = self.dispatch(operation, request).await?;
                    response.json::<PinListResult>()?.check()
                })
                .await
        })
        .await
    }

    /// Remove a pin. The hash is validated before any request is sent.
    pub async fn unpin(&self, hash: &str) -> GatewayResult<()> {
        let operation = Operation::Unpin;
        observed(operation, async {
            self.validator
                .validate_hash(hash)
                .map_err(|e| self.rejected_with(operation, e, "hash", json!(hash)))?;

            let request = ProviderRequest::delete(format!("{}/{}", UNPIN_PATH, hash));
            let ctx = AttemptContext::new(operation).with_detail("hash", json!(hash));

            let request = &request;
            self.retries
                .run(&ctx, |_| async move {
                    self.dispatch(operation, request).await?;
                    Ok(())
                })
                .await
        })
        .await
    }

    /// Probe credentials and reachability. Never errors.
    pub async fn test_connection(&self) -> bool {
        let operation = Operation::TestConnection;
        let request = ProviderRequest::get(TEST_AUTH_PATH);
        let ctx = AttemptContext::new(operation);

        let result = observed(operation, async {
            let request = &request;
            self.retries
                .run(&ctx, |_| async move {
                    self.dispatch(operation, request).await?;
                    Ok(())
                })
                .await
        })
        .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Provider connection test failed");
                false
            }
        }
    }

    /// One submission (plus any rate-limit resubmission). Non-success
    /// statuses become classified errors.
    async fn dispatch(
        &self,
        operation: Operation,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, PinError> {
        let response = self.transport.send(operation, request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(PinError::from_status(response.status, response.error_message()))
        }
    }

    fn rejected(&self, operation: Operation, err: PinError) -> PinError {
        self.record_rejection(operation, &err, Details::new());
        err
    }

    fn rejected_with(&self, operation: Operation, err: PinError, key: &str, value: Value) -> PinError {
        let mut details = Details::new();
        details.insert(key.to_string(), value);
        self.record_rejection(operation, &err, details);
        err
    }

    fn record_rejection(&self, operation: Operation, err: &PinError, mut details: Details) {
        details.insert("stage".into(), json!("validation"));
        details.insert("error".into(), json!(err.to_string()));
        if let Some(reason) = err.invalid_reason() {
            details.insert("code".into(), json!(reason.code()));
        }
        tracing::warn!(operation = %operation, error = %err, "Content rejected before submission");
        self.audit.record(
            AuditAction::attempt(operation),
            AuditStatus::Failure,
            Severity::High,
            details,
        );
    }
}

async fn observed<T, Fut>(operation: Operation, fut: Fut) -> GatewayResult<T>
where
    Fut: Future<Output = GatewayResult<T>>,
{
    let started = Instant::now();
    let result = fut.await;
    metrics::record_operation(operation.as_str(), result.is_ok(), started.elapsed());
    result
}
