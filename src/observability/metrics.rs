//! Metrics collection and exposition.
//!
//! # Metrics
//! - `vault_requests_total` (counter): requests by outcome
//! - `vault_request_duration_seconds` (histogram): gatekeeper latency by outcome
//! - `vault_entitlement_addresses` (gauge): addresses in the loaded table
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_decision(outcome: &'static str, start: Instant) {
    counter!("vault_requests_total", "outcome" => outcome).increment(1);
    histogram!("vault_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_table_size(addresses: usize) {
    gauge!("vault_entitlement_addresses").set(addresses as f64);
}
