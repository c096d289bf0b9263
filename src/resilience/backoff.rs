//! Exponential backoff with jitter.
//!
//! # Design Decisions
//! - `RetryPolicy` is immutable once built; every accessor is `&self`
//! - The deterministic delay is computed in floating point and capped before
//!   conversion, so large attempt numbers saturate at `max_delay`
//! - Jitter only ever lengthens a delay (factor in `[1.0, 1.1]`)

use rand::Rng;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::error::PolicyError;

/// Upper bound of the multiplicative jitter factor.
pub const MAX_JITTER_FACTOR: f64 = 1.1;

/// How many times to invoke an operation and how long to wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    backoff_factor: f64,
    jitter: bool,
}

impl RetryPolicy {
    /// Build a validated policy.
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
        jitter: bool,
    ) -> Result<Self, PolicyError> {
        if let Some(first) = Self::violations(max_attempts, base_delay, max_delay, backoff_factor)
            .into_iter()
            .next()
        {
            return Err(first);
        }

        Ok(Self {
            max_attempts,
            base_delay,
            max_delay,
            backoff_factor,
            jitter,
        })
    }

    /// Every constraint the given parameters break, in field order.
    pub fn violations(
        max_attempts: u32,
        base_delay: Duration,
        max_delay: Duration,
        backoff_factor: f64,
    ) -> Vec<PolicyError> {
        let mut errors = Vec::new();
        if max_attempts == 0 {
            errors.push(PolicyError::InvalidMaxAttempts(max_attempts));
        }
        if base_delay.is_zero() {
            errors.push(PolicyError::ZeroBaseDelay);
        }
        if max_delay < base_delay {
            errors.push(PolicyError::MaxBelowBase {
                base: base_delay,
                max: max_delay,
            });
        }
        if !backoff_factor.is_finite() || backoff_factor <= 1.0 {
            errors.push(PolicyError::InvalidBackoffFactor(backoff_factor));
        }
        errors
    }

    /// A policy that invokes the operation exactly once.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn backoff_factor(&self) -> f64 {
        self.backoff_factor
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }

    /// Deterministic delay after the given (1-based) failed attempt:
    /// `min(max_delay, base_delay * factor^(attempt - 1))`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1) - 1;
        let exponent = i32::try_from(exponent).unwrap_or(i32::MAX);
        let base_nanos = self.base_delay.as_nanos() as f64;
        let max_nanos = self.max_delay.as_nanos() as f64;

        let delay_nanos = base_nanos * self.backoff_factor.powi(exponent);
        // powi overflows to +inf, which min() folds back into the cap.
        let capped_nanos = delay_nanos.min(max_nanos);

        Duration::from_nanos(capped_nanos as u64)
    }

    /// Delay to actually sleep after the given failed attempt, with jitter applied.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);
        if !self.jitter {
            return delay;
        }

        let factor = rand::thread_rng().gen_range(1.0..=MAX_JITTER_FACTOR);
        delay.mul_f64(factor)
    }

    /// The un-jittered sleeps a call that fails every attempt would take.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts).map(move |attempt| self.delay_for(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(2000),
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl TryFrom<&RetryConfig> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(config: &RetryConfig) -> Result<Self, Self::Error> {
        RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.backoff_factor,
            config.jitter,
        )
    }
}
