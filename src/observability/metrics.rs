//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): relayed requests by status
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_upstream_failures_total` (counter): network failures by kind
//! - `backend_api_calls_total` (counter): admin API calls by method, outcome
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed proxy request (successful or not).
pub fn record_proxy_request(status: u16, start: Instant) {
    let status = status.to_string();
    counter!("proxy_requests_total", "status" => status.clone()).increment(1);
    histogram!("proxy_request_duration_seconds", "status" => status)
        .record(start.elapsed().as_secs_f64());
}

/// Record a network failure while contacting an upstream.
pub fn record_upstream_failure(kind: &'static str) {
    counter!("proxy_upstream_failures_total", "kind" => kind).increment(1);
}

/// Record a call to the backend admin API.
pub fn record_backend_call(method: &'static str, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    counter!("backend_api_calls_total", "method" => method, "outcome" => outcome).increment(1);
}
