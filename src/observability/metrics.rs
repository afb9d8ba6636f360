//! Metrics collection and exposition.
//!
//! # Metrics
//! - `stocks_http_requests_total` (counter): requests by route, status
//! - `stocks_http_request_duration_seconds` (histogram): handler latency by route
//! - `stocks_upstream_requests_total` (counter): provider calls by kind, outcome
//! - `stocks_upstream_duration_seconds` (histogram): provider latency by kind
//! - `stocks_fanout_in_flight` (gauge): upstream calls currently holding a permit
//! - `stocks_fanout_dropped_total` (counter): results dropped by reason
//! - `stocks_cache_lookups_total` (counter): lookups by cache, result
//! - `stocks_cache_entries` (gauge): live entries by cache
//! - `stocks_cache_expired_total` (counter): scheduled deletions that removed an entry
//!
//! Without an installed recorder every call here is a no-op.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, status: u16, start: Instant) {
    counter!("stocks_http_requests_total", "route" => route, "status" => status.to_string())
        .increment(1);
    histogram!("stocks_http_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_call(kind: &'static str, outcome: &'static str, start: Instant) {
    counter!("stocks_upstream_requests_total", "kind" => kind, "outcome" => outcome).increment(1);
    histogram!("stocks_upstream_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn inc_in_flight() {
    gauge!("stocks_fanout_in_flight").increment(1.0);
}

pub fn dec_in_flight() {
    gauge!("stocks_fanout_in_flight").decrement(1.0);
}

pub fn record_dropped(reason: &'static str) {
    counter!("stocks_fanout_dropped_total", "reason" => reason).increment(1);
}

pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("stocks_cache_lookups_total", "cache" => cache, "result" => result).increment(1);
}

pub fn record_cache_size(cache: &'static str, size: usize) {
    gauge!("stocks_cache_entries", "cache" => cache).set(size as f64);
}

pub fn record_cache_expired(cache: &'static str) {
    counter!("stocks_cache_expired_total", "cache" => cache).increment(1);
}
