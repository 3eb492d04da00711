//! Metrics collection and exposition.
//!
//! # Metrics
//! - `image_proxy_requests_total` (counter): inbound requests by outcome, status
//! - `image_proxy_request_duration_seconds` (histogram): inbound latency by outcome
//! - `image_proxy_upstream_duration_seconds` (histogram): upstream latency by result
//! - `image_proxy_payload_bytes` (histogram): relayed payload sizes
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished inbound request.
pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!(
        "image_proxy_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("image_proxy_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record one upstream exchange. `result` is `ok`, `status` or `error`.
pub fn record_upstream(result: &'static str, start: Instant) {
    histogram!("image_proxy_upstream_duration_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
}

/// Record the size of a relayed payload.
pub fn record_payload(bytes: usize) {
    histogram!("image_proxy_payload_bytes").record(bytes as f64);
}
