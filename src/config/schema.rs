//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Retry policy for remote calls.
    pub retry: RetryConfig,

    /// Circuit breaker settings.
    pub circuit_breaker: BreakerConfig,

    /// Per-attempt timeout settings.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Remote endpoint the CLI talks to.
    pub endpoint: EndpointConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per logical call, including the first.
    pub max_attempts: u32,

    /// Delay after the first failed attempt in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound for a single backoff delay in milliseconds.
    pub max_delay_ms: u64,

    /// Multiplier applied per attempt (must be > 1).
    pub backoff_factor: f64,

    /// Add up to 10% positive jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Route calls through a circuit breaker.
    pub enabled: bool,

    /// Consecutive failed logical calls before the circuit opens.
    pub failure_threshold: u32,

    /// Cooldown before a probe is allowed, in milliseconds.
    pub reset_timeout_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for a single attempt in milliseconds (none when absent).
    pub attempt_ms: Option<u64>,

    /// Whether a timed-out attempt may be retried.
    pub retry_on_timeout: bool,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            attempt_ms: Some(30_000),
            retry_on_timeout: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Remote endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EndpointConfig {
    /// URL that request bodies are POSTed to.
    pub url: String,

    /// Name used for the executor and breaker in logs and metrics.
    pub name: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/v1/chat/completions".to_string(),
            name: "llm".to_string(),
        }
    }
}
