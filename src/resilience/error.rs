//! Error taxonomy for resilient execution.

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Failure of a single attempt of the wrapped operation.
#[derive(Debug, PartialEq, Error)]
pub enum AttemptError<E> {
    /// The operation itself returned an error.
    #[error("{0}")]
    Operation(E),

    /// The attempt did not finish within the per-attempt deadline.
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),
}

impl<E> AttemptError<E> {
    /// Borrow the operation error, if this is not a timeout.
    pub fn operation(&self) -> Option<&E> {
        match self {
            AttemptError::Operation(e) => Some(e),
            AttemptError::TimedOut(_) => None,
        }
    }

    /// Consume into the operation error, if this is not a timeout.
    pub fn into_operation(self) -> Option<E> {
        match self {
            AttemptError::Operation(e) => Some(e),
            AttemptError::TimedOut(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::TimedOut(_))
    }
}

/// Terminal outcome of a logical call that did not succeed.
///
/// Every non-success path of the executor and the circuit breaker ends in
/// exactly one of these variants.
#[derive(Debug, Error)]
pub enum ExecutorError<E> {
    /// Every permitted attempt failed with a retryable error.
    #[error("retries exhausted after {attempts} attempts in {elapsed:?}: {last_error}")]
    RetryExhausted {
        attempts: u32,
        elapsed: Duration,
        last_error: AttemptError<E>,
    },

    /// An attempt failed with an error classified as permanent.
    #[error("fatal failure on attempt {attempts} after {elapsed:?}: {error}")]
    Fatal {
        attempts: u32,
        elapsed: Duration,
        error: AttemptError<E>,
    },

    /// The breaker rejected the call without invoking the operation.
    #[error("circuit open (reset timeout {reset_timeout:?})")]
    CircuitOpen {
        opened_at: Instant,
        reset_timeout: Duration,
    },

    /// The caller withdrew the request.
    #[error("cancelled after {attempts} attempts in {elapsed:?}")]
    Cancelled { attempts: u32, elapsed: Duration },

    /// Breaker bookkeeping could not be performed (poisoned state lock).
    #[error("circuit breaker unavailable: {0}")]
    BreakerUnavailable(String),
}

impl<E> ExecutorError<E> {
    /// Number of times the operation was invoked for this call.
    pub fn attempts(&self) -> u32 {
        match self {
            ExecutorError::RetryExhausted { attempts, .. }
            | ExecutorError::Fatal { attempts, .. }
            | ExecutorError::Cancelled { attempts, .. } => *attempts,
            ExecutorError::CircuitOpen { .. } | ExecutorError::BreakerUnavailable(_) => 0,
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, ExecutorError::CircuitOpen { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExecutorError::Cancelled { .. })
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecutorError::Fatal { .. })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, ExecutorError::RetryExhausted { .. })
    }

    /// The last attempt error, when the operation actually ran and failed.
    pub fn attempt_error(&self) -> Option<&AttemptError<E>> {
        match self {
            ExecutorError::RetryExhausted { last_error, .. } => Some(last_error),
            ExecutorError::Fatal { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Whether this outcome counts as one failure credit against a breaker.
    pub(crate) fn counts_against_breaker(&self) -> bool {
        matches!(
            self,
            ExecutorError::RetryExhausted { .. } | ExecutorError::Fatal { .. }
        )
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutorError::RetryExhausted { .. } => "exhausted",
            ExecutorError::Fatal { .. } => "fatal",
            ExecutorError::CircuitOpen { .. } => "circuit_open",
            ExecutorError::Cancelled { .. } => "cancelled",
            ExecutorError::BreakerUnavailable(_) => "breaker_unavailable",
        }
    }
}

/// Invalid retry policy or breaker configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be >= 1 (got {0})")]
    InvalidMaxAttempts(u32),

    #[error("base delay must be > 0")]
    ZeroBaseDelay,

    #[error("max delay {max:?} is below base delay {base:?}")]
    MaxBelowBase { base: Duration, max: Duration },

    #[error("backoff factor must be a finite number > 1 (got {0})")]
    InvalidBackoffFactor(f64),

    #[error("failure_threshold must be >= 1 (got {0})")]
    InvalidFailureThreshold(u32),

    #[error("reset timeout must be > 0")]
    ZeroResetTimeout,
}
