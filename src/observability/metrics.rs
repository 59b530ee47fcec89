//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dfd_api_requests_total` (counter): requests by endpoint, status
//! - `dfd_api_request_duration_seconds` (histogram): latency including padding
//! - `dfd_api_rejections_total` (counter): pipeline rejections by reason
//! - `dfd_api_rate_limit_entries` (gauge): identifiers tracked by the limiter
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(endpoint: &str, status: u16, start: Instant) {
    metrics::counter!(
        "dfd_api_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "dfd_api_request_duration_seconds",
        "endpoint" => endpoint.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_rejection(reason: &'static str) {
    metrics::counter!("dfd_api_rejections_total", "reason" => reason).increment(1);
}

pub fn record_rate_limit_entries(count: usize) {
    metrics::gauge!("dfd_api_rate_limit_entries").set(count as f64);
}
