//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! resilience/ produces:
//!     → tracing events (attempt failures, breaker transitions)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Each logical call runs in a span carrying a UUID `call_id`
//! - Metrics are cheap and no-ops when no recorder is installed

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
