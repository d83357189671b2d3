//! Metrics collection and exposition.
//!
//! # Metrics
//! - `forwarder_requests_total` (counter): inbound requests by endpoint, status
//! - `forwarder_header_validation_total` (counter): forwarding header checks by outcome
//! - `forwarder_outbound_requests_total` (counter): outbound calls by strategy, outcome
//! - `forwarder_outbound_duration_seconds` (histogram): outbound call latency by strategy

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(endpoint: &str, status: u16) {
    metrics::counter!(
        "forwarder_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_validation(outcome: &'static str) {
    metrics::counter!("forwarder_header_validation_total", "outcome" => outcome).increment(1);
}

pub fn record_outbound(strategy: &'static str, outcome: &'static str, started: Instant) {
    metrics::counter!(
        "forwarder_outbound_requests_total",
        "strategy" => strategy,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("forwarder_outbound_duration_seconds", "strategy" => strategy)
        .record(started.elapsed().as_secs_f64());
}
