//! Metrics collection and exposition.
//!
//! # Metrics
//! - `cdn_proxy_requests_total` (counter): requests by method, status, outcome
//! - `cdn_proxy_request_duration_seconds` (histogram): latency distribution
//! - `cdn_proxy_cache_events_total` (counter): hit / miss / store / reject
//! - `cdn_proxy_cache_bytes` (gauge): bytes held by the response cache
//! - `cdn_proxy_cache_entries` (gauge): entries held by the response cache
//!
//! Recording is a no-op until an exporter is installed.

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

/// Record one finished request.
pub fn record_request(method: &str, status: u16, outcome: &'static str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("outcome", outcome.to_string()),
    ];
    metrics::counter!("cdn_proxy_requests_total", &labels).increment(1);
    metrics::histogram!("cdn_proxy_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_event(event: &'static str) {
    metrics::counter!("cdn_proxy_cache_events_total", "event" => event).increment(1);
}

pub fn record_cache_size(bytes: u64, entries: usize) {
    metrics::gauge!("cdn_proxy_cache_bytes").set(bytes as f64);
    metrics::gauge!("cdn_proxy_cache_entries").set(entries as f64);
}
