//! Retry-with-backoff and circuit breaking for calls to hosted model APIs.

pub mod config;
pub mod http;
pub mod observability;
pub mod resilience;

pub use config::ResilienceConfig;
pub use http::RemoteClient;
pub use resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, ExecutorError, RemoteError,
    ResilientExecutor, RetryPolicy,
};
