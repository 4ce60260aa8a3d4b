//! Metrics collection and exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, status
//! - `api_request_duration_seconds` (histogram): latency distribution
//! - `api_rate_limited_total` (counter): requests rejected with 429
//! - `api_rate_limit_keys` (gauge): client keys currently tracked
//! - `api_suspicious_requests_total` (counter): detections by pattern
//! - `api_authorization_total` (counter): authorizer outcomes
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without an exporter pay almost nothing.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "api_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("api_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited() {
    metrics::counter!("api_rate_limited_total").increment(1);
}

pub fn record_rate_limit_keys(count: usize) {
    metrics::gauge!("api_rate_limit_keys").set(count as f64);
}

pub fn record_suspicious(pattern: &'static str) {
    metrics::counter!("api_suspicious_requests_total", "pattern" => pattern).increment(1);
}

pub fn record_authorization(outcome: &'static str) {
    metrics::counter!("api_authorization_total", "outcome" => outcome).increment(1);
}

/// Middleware recording request count and latency.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let response = next.run(request).await;
    record_request(method.as_str(), response.status().as_u16(), start);
    response
}
