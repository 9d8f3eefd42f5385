//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_routing_decisions_total` (counter): by action and experiment flag
//! - `edge_origin_requests_total` (counter): by status
//! - `edge_origin_request_duration_seconds` (histogram)
//! - `edge_flag_decisions_total` (counter): decided vs fallback
//! - `edge_webhook_requests_total` (counter): by result

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_routing_decision(action: &'static str, experiment: bool) {
    counter!(
        "edge_routing_decisions_total",
        "action" => action,
        "experiment" => if experiment { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_origin_request(status: u16, start: Instant) {
    counter!("edge_origin_requests_total", "status" => status.to_string()).increment(1);
    histogram!("edge_origin_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_flag_decision(outcome: &'static str) {
    counter!("edge_flag_decisions_total", "outcome" => outcome).increment(1);
}

pub fn record_webhook(result: &'static str) {
    counter!("edge_webhook_requests_total", "result" => result).increment(1);
}
