//! Metrics collection and exposition.
//!
//! # Metrics
//! - `resilience_calls_total` (counter): logical calls by executor, outcome
//! - `resilience_call_duration_seconds` (histogram): wall time per logical call
//! - `resilience_attempt_failures_total` (counter): failed attempts by class
//! - `resilience_breaker_rejections_total` (counter): calls shed by an open circuit
//! - `resilience_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until a
//!   recorder is installed
//! - The Prometheus exporter is opt-in via `ObservabilityConfig`

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_call(executor: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "resilience_calls_total",
        "executor" => executor.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "resilience_call_duration_seconds",
        "executor" => executor.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_attempt_failure(executor: &str, class: &'static str) {
    metrics::counter!(
        "resilience_attempt_failures_total",
        "executor" => executor.to_string(),
        "class" => class
    )
    .increment(1);
}

pub fn record_breaker_rejection(breaker: &str) {
    metrics::counter!(
        "resilience_breaker_rejections_total",
        "breaker" => breaker.to_string()
    )
    .increment(1);
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("resilience_breaker_state", "breaker" => breaker.to_string()).set(value);
}
