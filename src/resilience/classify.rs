//! Failure classification.
//!
//! # Responsibilities
//! - Decide whether a failed attempt is worth retrying
//! - Keep the executor independent of any concrete error taxonomy
//! - Provide `RemoteError`, the default taxonomy for HTTP-style remote calls
//!
//! # Design Decisions
//! - Network errors, timeouts, 408, 429 and 5xx are transient
//! - Validation, auth, decode and every other 4xx are permanent
//! - Callers swap in their own `Classifier` without touching the executor

use thiserror::Error;

/// Whether a failure should be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Fatal,
}

/// Decides the retry class of an operation error.
pub trait Classifier<E>: Send + Sync {
    fn classify(&self, error: &E) -> RetryClass;
}

impl<E, F> Classifier<E> for F
where
    F: Fn(&E) -> RetryClass + Send + Sync,
{
    fn classify(&self, error: &E) -> RetryClass {
        self(error)
    }
}

/// Implemented by error types that know whether they are transient.
pub trait Classify {
    fn retry_class(&self) -> RetryClass;

    fn is_retryable(&self) -> bool {
        self.retry_class() == RetryClass::Retryable
    }
}

/// Classifier that defers to the error's own [`Classify`] impl.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultClassifier;

impl<E: Classify> Classifier<E> for DefaultClassifier {
    fn classify(&self, error: &E) -> RetryClass {
        error.retry_class()
    }
}

/// Classifier that treats every failure as retryable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E> Classifier<E> for AlwaysRetry {
    fn classify(&self, _error: &E) -> RetryClass {
        RetryClass::Retryable
    }
}

/// Result of one invocation of the wrapped operation.
#[derive(Debug, PartialEq, Eq)]
pub enum AttemptOutcome<T, E> {
    Success(T),
    RetryableFailure(E),
    FatalFailure(E),
}

impl<T, E> AttemptOutcome<T, E> {
    /// Tag a raw result with its retry class.
    pub fn classify<C>(result: Result<T, E>, classifier: &C) -> Self
    where
        C: Classifier<E> + ?Sized,
    {
        match result {
            Ok(value) => AttemptOutcome::Success(value),
            Err(error) => match classifier.classify(&error) {
                RetryClass::Retryable => AttemptOutcome::RetryableFailure(error),
                RetryClass::Fatal => AttemptOutcome::FatalFailure(error),
            },
        }
    }
}

/// Failures of a call to a remote HTTP-style service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Connection refused, reset, DNS failure and similar transport errors.
    #[error("network error: {0}")]
    Network(String),

    /// The remote did not answer in time.
    #[error("request timed out")]
    Timeout,

    /// The remote answered with a non-success status.
    #[error("remote returned status {code}: {message}")]
    Status { code: u16, message: String },

    /// The request was malformed before it left the process.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Credentials were rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Map an HTTP status to an error, folding 401/403 into `Auth`.
    pub fn from_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            401 | 403 => RemoteError::Auth(message),
            _ => RemoteError::Status { code, message },
        }
    }
}

/// Retry class of an HTTP status code.
pub fn classify_status(code: u16) -> RetryClass {
    match code {
        408 | 429 | 500..=599 => RetryClass::Retryable,
        _ => RetryClass::Fatal,
    }
}

impl Classify for RemoteError {
    fn retry_class(&self) -> RetryClass {
        match self {
            RemoteError::Network(_) | RemoteError::Timeout => RetryClass::Retryable,
            RemoteError::Status { code, .. } => classify_status(*code),
            RemoteError::Validation(_) | RemoteError::Auth(_) | RemoteError::Decode(_) => {
                RetryClass::Fatal
            }
        }
    }
}
