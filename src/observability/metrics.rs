//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pin_gateway_requests_total` (counter): logical operations by operation, outcome
//! - `pin_gateway_attempts_total` (counter): individual attempts by operation, outcome
//! - `pin_gateway_upload_bytes` (histogram): accepted payload sizes
//! - `pin_gateway_request_duration_seconds` (histogram): end-to-end operation latency
//! - `pin_gateway_rate_limit_hits_total` (counter): provider 429 responses
//! - `pin_gateway_audit_failures_total` (counter): sink or webhook failures
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_operation(operation: &'static str, success: bool, elapsed: Duration) {
    let outcome = if success { "success" } else { "failure" };
    counter!("pin_gateway_requests_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
    histogram!("pin_gateway_request_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
}

pub fn record_attempt(operation: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("pin_gateway_attempts_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}

pub fn record_upload_size(bytes: usize) {
    histogram!("pin_gateway_upload_bytes").record(bytes as f64);
}

pub fn record_rate_limited(operation: &'static str) {
    counter!("pin_gateway_rate_limit_hits_total", "operation" => operation).increment(1);
}

pub fn record_audit_failure(stage: &'static str) {
    counter!("pin_gateway_audit_failures_total", "stage" => stage).increment(1);
}
