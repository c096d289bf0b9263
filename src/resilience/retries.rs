//! Retry logic.
//!
//! # Responsibilities
//! - Invoke an operation up to `max_attempts` times
//! - Classify each failure as retryable or fatal
//! - Sleep with exponential backoff + jitter between attempts
//! - Stop promptly when the caller cancels
//!
//! # Design Decisions
//! - Attempts for one logical call are strictly sequential
//! - Waiting is a Tokio timer sleep, never a blocked thread
//! - A fatal failure short-circuits, even on the first attempt
//! - Cancellation is its own outcome, never reported as a failure

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::observability::metrics;
use crate::resilience::backoff::RetryPolicy;
use crate::resilience::classify::{
    AttemptOutcome, Classifier, Classify, DefaultClassifier, RetryClass,
};
use crate::resilience::error::{AttemptError, ExecutorError};
use crate::resilience::timeouts::run_attempt;

/// Hook invoked before each backoff sleep.
///
/// Runs synchronously on the retry task, so implementations must return
/// quickly (log, bump a counter, or hand off to a channel).
pub trait AttemptObserver<E>: Send + Sync {
    fn on_attempt_failed(&self, attempt: u32, error: &AttemptError<E>, delay: Duration);
}

impl<E, F> AttemptObserver<E> for F
where
    F: Fn(u32, &AttemptError<E>, Duration) + Send + Sync,
{
    fn on_attempt_failed(&self, attempt: u32, error: &AttemptError<E>, delay: Duration) {
        self(attempt, error, delay)
    }
}

/// Wraps fallible async operations with retry and exponential backoff.
pub struct ResilientExecutor<E> {
    name: String,
    classifier: Arc<dyn Classifier<E>>,
    observer: Option<Arc<dyn AttemptObserver<E>>>,
    attempt_timeout: Option<Duration>,
    timeout_class: RetryClass,
}

impl<E: Classify> ResilientExecutor<E> {
    /// Executor that classifies errors through their [`Classify`] impl.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_classifier(name, DefaultClassifier)
    }
}

impl<E> ResilientExecutor<E> {
    /// Executor with a caller-supplied classifier.
    pub fn with_classifier<C>(name: impl Into<String>, classifier: C) -> Self
    where
        C: Classifier<E> + 'static,
    {
        Self {
            name: name.into(),
            classifier: Arc::new(classifier),
            observer: None,
            attempt_timeout: None,
            timeout_class: RetryClass::Retryable,
        }
    }

    /// Install the `on_attempt_failed` hook.
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: AttemptObserver<E> + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Give every attempt its own deadline.
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// How a timed-out attempt is classified (retryable by default).
    pub fn with_timeout_class(mut self, class: RetryClass) -> Self {
        self.timeout_class = class;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout
    }

    fn classify(&self, error: &AttemptError<E>) -> RetryClass {
        match error {
            AttemptError::Operation(e) => self.classifier.classify(e),
            AttemptError::TimedOut(_) => self.timeout_class,
        }
    }

    /// Tag one attempt's result: success, or a failure and its class.
    fn outcome<T>(&self, result: Result<T, AttemptError<E>>) -> AttemptOutcome<T, AttemptError<E>> {
        match result {
            Ok(value) => AttemptOutcome::Success(value),
            Err(error) => match self.classify(&error) {
                RetryClass::Retryable => AttemptOutcome::RetryableFailure(error),
                RetryClass::Fatal => AttemptOutcome::FatalFailure(error),
            },
        }
    }

    /// Run `operation` under `policy`.
    pub async fn execute<T, F, Fut>(&self, policy: &RetryPolicy, operation: F) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run(policy, None, operation).await
    }

    /// Run `operation` under `policy`, aborting as soon as `cancel` fires.
    pub async fn execute_cancellable<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.run(policy, Some(cancel), operation).await
    }

    pub(crate) async fn run<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        cancel: Option<&CancellationToken>,
        operation: F,
    ) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let call_id = Uuid::new_v4();
        let span = tracing::debug_span!("resilient_call", executor = %self.name, call_id = %call_id);
        let start = Instant::now();

        let result = self.retry_loop(policy, cancel, operation, start).instrument(span).await;
        metrics::record_call(
            &self.name,
            result.as_ref().err().map_or("success", ExecutorError::kind),
            start.elapsed(),
        );
        result
    }

    async fn retry_loop<T, F, Fut>(
        &self,
        policy: &RetryPolicy,
        cancel: Option<&CancellationToken>,
        mut operation: F,
        start: Instant,
    ) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = policy.max_attempts();
        let mut attempt: u32 = 0;

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(self.cancelled(attempt, start));
            }

            attempt += 1;
            let pending = run_attempt(self.attempt_timeout, operation());
            let result = match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(self.cancelled(attempt, start)),
                    result = pending => result,
                },
                None => pending.await,
            };

            let error = match self.outcome(result) {
                AttemptOutcome::Success(value) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Operation succeeded after retry");
                    }
                    return Ok(value);
                }
                AttemptOutcome::FatalFailure(error) => {
                    tracing::warn!(attempt, error = %error, "Fatal failure, not retrying");
                    metrics::record_attempt_failure(&self.name, "fatal");
                    return Err(ExecutorError::Fatal {
                        attempts: attempt,
                        elapsed: start.elapsed(),
                        error,
                    });
                }
                AttemptOutcome::RetryableFailure(error) => error,
            };

            let elapsed = start.elapsed();
            metrics::record_attempt_failure(&self.name, "retryable");
            if attempt >= max_attempts {
                tracing::error!(
                    attempts = attempt,
                    elapsed_ms = elapsed.as_millis() as u64,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(ExecutorError::RetryExhausted {
                    attempts: attempt,
                    elapsed,
                    last_error: error,
                });
            }

            let delay = policy.backoff(attempt);
            tracing::warn!(
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Attempt failed, backing off"
            );
            if let Some(observer) = &self.observer {
                observer.on_attempt_failed(attempt, &error, delay);
            }

            match cancel {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(self.cancelled(attempt, start)),
                    _ = tokio::time::sleep(delay) => {}
                },
                None => tokio::time::sleep(delay).await,
            }
        }
    }

    fn cancelled(&self, attempts: u32, start: Instant) -> ExecutorError<E> {
        tracing::info!(attempts, "Call cancelled by caller");
        ExecutorError::Cancelled {
            attempts,
            elapsed: start.elapsed(),
        }
    }
}

impl<E> Clone for ResilientExecutor<E> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            classifier: Arc::clone(&self.classifier),
            observer: self.observer.clone(),
            attempt_timeout: self.attempt_timeout,
            timeout_class: self.timeout_class,
        }
    }
}

impl<E> fmt::Debug for ResilientExecutor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientExecutor")
            .field("name", &self.name)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("timeout_class", &self.timeout_class)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
