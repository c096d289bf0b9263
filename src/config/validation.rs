//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges by building the runtime policy types
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ResilienceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::ResilienceConfig;
use crate::resilience::{CircuitBreakerConfig, PolicyError, RetryPolicy};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("retry: {0}")]
    Retry(PolicyError),

    #[error("circuit_breaker: {0}")]
    Breaker(PolicyError),

    #[error("timeouts.attempt_ms must be > 0")]
    ZeroAttemptTimeout,

    #[error("endpoint.url '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("observability.log_level '{0}' is not a valid filter")]
    InvalidLogLevel(String),
}

/// Check every section, collecting all problems.
pub fn validate_config(config: &ResilienceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let retry = &config.retry;
    errors.extend(
        RetryPolicy::violations(
            retry.max_attempts,
            Duration::from_millis(retry.base_delay_ms),
            Duration::from_millis(retry.max_delay_ms),
            retry.backoff_factor,
        )
        .into_iter()
        .map(ValidationError::Retry),
    );

    let breaker = &config.circuit_breaker;
    if breaker.enabled {
        errors.extend(
            CircuitBreakerConfig::violations(
                breaker.failure_threshold,
                Duration::from_millis(breaker.reset_timeout_ms),
            )
            .into_iter()
            .map(ValidationError::Breaker),
        );
    }

    if config.timeouts.attempt_ms == Some(0) {
        errors.push(ValidationError::ZeroAttemptTimeout);
    }

    match url::Url::parse(&config.endpoint.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            url: config.endpoint.url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            url: config.endpoint.url.clone(),
            reason: e.to_string(),
        }),
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if tracing_subscriber::EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
