//! Metrics collection and exposition.
//!
//! # Metrics
//! - `groups_injector_requests_total` (counter): requests by method, status
//! - `groups_injector_request_duration_seconds` (histogram): end-to-end latency
//! - `groups_injector_enrichment_total` (counter): enrichment outcomes
//! - `groups_injector_identity_lookup_duration_seconds` (histogram): lookup latency by result
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed proxied request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "groups_injector_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("groups_injector_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

/// Record the outcome of one enrichment pass.
pub fn record_enrichment(outcome: &'static str) {
    metrics::counter!("groups_injector_enrichment_total", "outcome" => outcome).increment(1);
}

/// Record the latency of one identity lookup.
pub fn record_lookup(result: &'static str, start: Instant) {
    metrics::histogram!(
        "groups_injector_identity_lookup_duration_seconds",
        "result" => result
    )
    .record(start.elapsed().as_secs_f64());
}
