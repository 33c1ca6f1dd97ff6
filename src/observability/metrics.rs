//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_jobs_total` (counter): finished upload jobs by outcome
//! - `gateway_job_duration_seconds` (histogram): upload-to-verdict latency
//! - `gateway_retrievals_total` (counter): photo downloads by outcome
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished job. `outcome` is `"ok"` or an error kind.
pub fn record_job(outcome: &'static str, started: Instant) {
    counter!("gateway_jobs_total", "outcome" => outcome).increment(1);
    histogram!("gateway_job_duration_seconds", "outcome" => outcome)
        .record(started.elapsed().as_secs_f64());
}

/// Record a retrieval attempt.
pub fn record_retrieval(outcome: &'static str) {
    counter!("gateway_retrievals_total", "outcome" => outcome).increment(1);
}
