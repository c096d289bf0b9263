//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a remote dependency:
//!     → circuit_breaker.rs (admit, fail fast, or admit as the single probe)
//!     → retries.rs (attempt loop, one logical call)
//!         → timeouts.rs (per-attempt deadline)
//!         → classify.rs (retryable or fatal?)
//!         → backoff.rs (sleep before the next attempt)
//!     → circuit_breaker.rs (one failure credit or a reset per logical call)
//! ```
//!
//! # Design Decisions
//! - Retries and circuit breaking are separate units; the breaker wraps the
//!   executor so retries never happen inside an open circuit
//! - Every non-success path surfaces as an `ExecutorError` variant
//! - Classification is injected, so the core knows no concrete error taxonomy

pub mod backoff;
pub mod circuit_breaker;
pub mod classify;
pub mod error;
pub mod retries;
pub mod timeouts;

pub use backoff::RetryPolicy;
pub use circuit_breaker::{BreakerSnapshot, CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use classify::{
    AlwaysRetry, AttemptOutcome, Classifier, Classify, DefaultClassifier, RemoteError, RetryClass,
};
pub use error::{AttemptError, ExecutorError, PolicyError};
pub use retries::{AttemptObserver, ResilientExecutor};
