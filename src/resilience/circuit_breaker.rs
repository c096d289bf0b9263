//! Circuit breaker for remote dependency protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: dependency assumed down, requests fail fast
//! - Half-Open: one probe request tests whether the dependency recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: reset_timeout elapsed since opened_at
//! Half-Open → Closed: probe request succeeds
//! Half-Open → Open: probe request fails (opened_at reset)
//! ```
//!
//! # Design Decisions
//! - One breaker value per dependency, shared by `Arc`; no global state
//! - The breaker decides whether to try at all; the executor decides how
//!   many times to try once admitted
//! - One failure credit per logical call, after retries are exhausted
//! - Single probe in Half-Open, held by an RAII guard so a dropped or
//!   cancelled probe frees the slot without counting as a failure
//! - Bookkeeping happens under a `std::sync::Mutex` that is never held
//!   across an `.await`

use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::resilience::backoff::RetryPolicy;
use crate::resilience::error::{ExecutorError, PolicyError};
use crate::resilience::retries::ResilientExecutor;

/// Circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trip threshold and cooldown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreakerConfig {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Result<Self, PolicyError> {
        if let Some(first) = Self::violations(failure_threshold, reset_timeout).into_iter().next() {
            return Err(first);
        }
        Ok(Self {
            failure_threshold,
            reset_timeout,
        })
    }

    /// Every constraint the given parameters break.
    pub fn violations(failure_threshold: u32, reset_timeout: Duration) -> Vec<PolicyError> {
        let mut errors = Vec::new();
        if failure_threshold == 0 {
            errors.push(PolicyError::InvalidFailureThreshold(failure_threshold));
        }
        if reset_timeout.is_zero() {
            errors.push(PolicyError::ZeroResetTimeout);
        }
        errors
    }

    pub fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    pub fn reset_timeout(&self) -> Duration {
        self.reset_timeout
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

impl TryFrom<&BreakerConfig> for CircuitBreakerConfig {
    type Error = PolicyError;

    fn try_from(config: &BreakerConfig) -> Result<Self, Self::Error> {
        CircuitBreakerConfig::new(
            config.failure_threshold,
            Duration::from_millis(config.reset_timeout_ms),
        )
    }
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// Set while the circuit is Open or Half-Open.
    pub opened_at: Option<Instant>,
}

#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

/// Guards a dependency by failing fast after repeated failures.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, CircuitState::Closed);
        Self {
            name,
            config,
            inner: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. Does not perform the Open → Half-Open transition;
    /// that only happens when a call is admitted.
    pub fn state(&self) -> CircuitState {
        self.snapshot().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let s = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        BreakerSnapshot {
            state: s.state,
            consecutive_failures: s.consecutive_failures,
            opened_at: s.opened_at,
        }
    }

    /// Force the circuit Closed and clear all counters, including a poisoned lock.
    pub fn reset(&self) {
        self.inner.clear_poison();
        let mut s = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        s.state = CircuitState::Closed;
        s.consecutive_failures = 0;
        s.opened_at = None;
        s.probe_in_flight = false;
        tracing::info!(breaker = %self.name, "Circuit manually reset");
        metrics::record_breaker_state(&self.name, CircuitState::Closed);
    }

    /// Run `operation` through `executor` if the circuit admits it.
    pub async fn execute<T, E, F, Fut>(
        &self,
        executor: &ResilientExecutor<E>,
        policy: &RetryPolicy,
        operation: F,
    ) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.guarded(executor, policy, None, operation).await
    }

    /// Like [`CircuitBreaker::execute`], aborting when `cancel` fires.
    /// A cancelled call never counts against the failure threshold.
    pub async fn execute_cancellable<T, E, F, Fut>(
        &self,
        executor: &ResilientExecutor<E>,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        self.guarded(executor, policy, Some(cancel), operation).await
    }

    async fn guarded<T, E, F, Fut>(
        &self,
        executor: &ResilientExecutor<E>,
        policy: &RetryPolicy,
        cancel: Option<&CancellationToken>,
        operation: F,
    ) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let ticket = self.admit()?;
        let result = executor.run(policy, cancel, operation).await;

        match &result {
            Ok(_) => ticket.succeeded()?,
            Err(e) if e.counts_against_breaker() => ticket.failed()?,
            Err(_) => ticket.release(),
        }
        result
    }

    fn lock<E>(&self) -> Result<MutexGuard<'_, BreakerState>, ExecutorError<E>> {
        self.inner.lock().map_err(|e| {
            tracing::error!(breaker = %self.name, error = %e, "Circuit breaker state poisoned");
            ExecutorError::BreakerUnavailable(e.to_string())
        })
    }

    fn admit<E>(&self) -> Result<Ticket<'_>, ExecutorError<E>> {
        let mut s = self.lock()?;

        match s.state {
            CircuitState::Closed => Ok(Ticket::new(self, false)),
            CircuitState::Open => {
                let opened_at = *s.opened_at.get_or_insert_with(Instant::now);
                if opened_at.elapsed() >= self.config.reset_timeout {
                    s.state = CircuitState::HalfOpen;
                    s.probe_in_flight = true;
                    tracing::info!(breaker = %self.name, "Reset timeout elapsed, circuit half-open");
                    metrics::record_breaker_state(&self.name, CircuitState::HalfOpen);
                    Ok(Ticket::new(self, true))
                } else {
                    Err(self.reject(opened_at))
                }
            }
            CircuitState::HalfOpen => {
                let opened_at = *s.opened_at.get_or_insert_with(Instant::now);
                if s.probe_in_flight {
                    Err(self.reject(opened_at))
                } else {
                    // The previous probe was abandoned; this call takes its place.
                    s.probe_in_flight = true;
                    Ok(Ticket::new(self, true))
                }
            }
        }
    }

    fn reject<E>(&self, opened_at: Instant) -> ExecutorError<E> {
        tracing::debug!(breaker = %self.name, "Circuit open, rejecting call");
        metrics::record_breaker_rejection(&self.name);
        ExecutorError::CircuitOpen {
            opened_at,
            reset_timeout: self.config.reset_timeout,
        }
    }

    fn transition(&self, s: &mut BreakerState, to: CircuitState) {
        if s.state == to {
            return;
        }
        match to {
            CircuitState::Open => tracing::warn!(
                breaker = %self.name,
                from = %s.state,
                consecutive_failures = s.consecutive_failures,
                "Circuit opened"
            ),
            _ => tracing::info!(breaker = %self.name, from = %s.state, to = %to, "Circuit state changed"),
        }
        s.state = to;
        metrics::record_breaker_state(&self.name, to);
    }
}

/// Admission slip for one logical call.
///
/// Settling it applies the call's outcome to the breaker; dropping it
/// unsettled (future dropped mid-call) only frees the probe slot.
struct Ticket<'a> {
    breaker: &'a CircuitBreaker,
    probe: bool,
    settled: bool,
}

impl<'a> Ticket<'a> {
    fn new(breaker: &'a CircuitBreaker, probe: bool) -> Self {
        Self {
            breaker,
            probe,
            settled: false,
        }
    }

    fn succeeded<E>(mut self) -> Result<(), ExecutorError<E>> {
        self.settled = true;
        let breaker = self.breaker;
        let mut s = breaker.lock()?;

        if self.probe {
            s.probe_in_flight = false;
            s.consecutive_failures = 0;
            s.opened_at = None;
            breaker.transition(&mut s, CircuitState::Closed);
        } else if matches!(s.state, CircuitState::Closed | CircuitState::HalfOpen) {
            s.consecutive_failures = 0;
        }
        // A call admitted before the circuit opened cannot close it.
        Ok(())
    }

    fn failed<E>(mut self) -> Result<(), ExecutorError<E>> {
        self.settled = true;
        let breaker = self.breaker;
        let mut s = breaker.lock()?;
        s.consecutive_failures = s.consecutive_failures.saturating_add(1);

        if self.probe {
            s.probe_in_flight = false;
            s.opened_at = Some(Instant::now());
            tracing::warn!(breaker = %breaker.name, "Probe failed");
            breaker.transition(&mut s, CircuitState::Open);
        } else if s.state == CircuitState::Closed
            && s.consecutive_failures >= breaker.config.failure_threshold
        {
            s.opened_at = Some(Instant::now());
            breaker.transition(&mut s, CircuitState::Open);
        }
        Ok(())
    }

    fn release(mut self) {
        self.settled = true;
        if self.probe {
            self.free_probe();
        }
    }

    fn free_probe(&self) {
        let mut s = self
            .breaker
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        s.probe_in_flight = false;
        tracing::debug!(breaker = %self.breaker.name, "Probe abandoned, slot released");
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.settled && self.probe {
            self.free_probe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::classify::{AlwaysRetry, RemoteError};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn breaker(threshold: u32, reset_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig::new(threshold, Duration::from_millis(reset_ms)).unwrap(),
        )
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(
            max_attempts,
            Duration::from_millis(10),
            Duration::from_millis(100),
            2.0,
            false,
        )
        .unwrap()
    }

    async fn fail_once(cb: &CircuitBreaker, exec: &ResilientExecutor<String>, calls: &AtomicU32) -> ExecutorError<String> {
        cb.execute(exec, &policy(2), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("down".to_string()) }
        })
        .await
        .unwrap_err()
    }

    #[tokio::test(start_paused = true)]
    async fn test_opens_after_threshold_and_fails_fast() {
        let cb = breaker(3, 1000);
        let exec = ResilientExecutor::with_classifier("test", AlwaysRetry);
        let calls = AtomicU32::new(0);

        for i in 1..=3 {
            let err = fail_once(&cb, &exec, &calls).await;
            assert!(err.is_exhausted());
            assert_eq!(cb.snapshot().consecutive_failures, i);
        }
        // One credit per logical call, two attempts each.
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.snapshot().opened_at.is_some());

        let err = fail_once(&cb, &exec, &calls).await;
        assert!(err.is_circuit_open());
        assert_eq!(calls.load(Ordering::SeqCst), 6, "operation must not run while open");
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_success_closes_circuit() {
        let cb = breaker(2, 500);
        let exec = ResilientExecutor::with_classifier("test", AlwaysRetry);
        let calls = AtomicU32::new(0);

        fail_once(&cb, &exec, &calls).await;
        fail_once(&cb, &exec, &calls).await;
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(fail_once(&cb, &exec, &calls).await.is_circuit_open());

        tokio::time::advance(Duration::from_millis(1)).await;
        let result = cb
            .execute(&exec, &policy(1), || async { Ok::<_, String>("pong") })
            .await;
        assert_eq!(result.unwrap(), "pong");

        let snap = cb.snapshot();
        assert_eq!(snap.state, CircuitState::Closed);
        assert_eq!(snap.consecutive_failures, 0);
        assert_eq!(snap.opened_at, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_failure_reopens_with_new_timestamp() {
        let cb = breaker(1, 500);
        let exec = ResilientExecutor::with_classifier("test", AlwaysRetry);
        let calls = AtomicU32::new(0);

        fail_once(&cb, &exec, &calls).await;
        let first_opened = cb.snapshot().opened_at.unwrap();

        tokio::time::advance(Duration::from_millis(600)).await;
        let err = fail_once(&cb, &exec, &calls).await;
        assert!(err.is_exhausted(), "probe runs the full retry policy");

        let snap = cb.snapshot();
        assert_eq!(snap.state, CircuitState::Open);
        assert!(snap.opened_at.unwrap() > first_opened);
        assert!(fail_once(&cb, &exec, &calls).await.is_circuit_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_consecutive_failures() {
        let cb = breaker(3, 500);
        let exec = ResilientExecutor::with_classifier("test", AlwaysRetry);
        let calls = AtomicU32::new(0);

        fail_once(&cb, &exec, &calls).await;
        fail_once(&cb, &exec, &calls).await;
        cb.execute(&exec, &policy(1), || async { Ok::<_, String>(()) })
            .await
            .unwrap();
        assert_eq!(cb.snapshot().consecutive_failures, 0);

        fail_once(&cb, &exec, &calls).await;
        fail_once(&cb, &exec, &calls).await;
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_failure_counts_once() {
        let cb = breaker(2, 500);
        let exec: ResilientExecutor<RemoteError> = ResilientExecutor::new("test");

        for _ in 0..2 {
            let err = cb
                .execute(&exec, &policy(5), || async {
                    Err::<(), _>(RemoteError::Auth("revoked key".into()))
                })
                .await
                .unwrap_err();
            assert!(err.is_fatal());
        }
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_probe_under_concurrency() {
        let cb = Arc::new(breaker(1, 100));
        let exec = Arc::new(ResilientExecutor::with_classifier("test", AlwaysRetry));
        let calls = Arc::new(AtomicU32::new(0));

        fail_once(&cb, &exec, &calls).await;
        tokio::time::advance(Duration::from_millis(100)).await;

        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let probe = {
            let cb = Arc::clone(&cb);
            let exec = Arc::clone(&exec);
            let mut started_tx = Some(started_tx);
            let mut release_rx = Some(release_rx);
            tokio::spawn(async move {
                cb.execute(&exec, &policy(1), || {
                    let started = started_tx.take();
                    let release = release_rx.take();
                    async move {
                        if let Some(tx) = started {
                            let _ = tx.send(());
                        }
                        if let Some(rx) = release {
                            let _ = rx.await;
                        }
                        Ok::<_, String>("recovered")
                    }
                })
                .await
            })
        };
        started_rx.await.unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        let mut others = Vec::new();
        for _ in 0..10 {
            let cb = Arc::clone(&cb);
            let exec = Arc::clone(&exec);
            let calls = Arc::clone(&calls);
            others.push(tokio::spawn(async move {
                cb.execute(&exec, &policy(1), || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok::<_, String>("piggyback") }
                })
                .await
            }));
        }
        for handle in others {
            assert!(handle.await.unwrap().unwrap_err().is_circuit_open());
        }

        release_tx.send(()).unwrap();
        assert_eq!(probe.await.unwrap().unwrap(), "recovered");
        assert_eq!(cb.state(), CircuitState::Closed);
        // Only the first failing call ever reached its operation.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_not_counted() {
        let cb = breaker(1, 500);
        let exec = ResilientExecutor::with_classifier("test", AlwaysRetry);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            trigger.cancel();
        });

        let err = cb
            .execute_cancellable(&exec, &policy(3), &cancel, || async {
                Err::<(), _>("down".to_string())
            })
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        let snap = cb.snapshot();
        assert_eq!(snap.consecutive_failures, 0);
        assert_eq!(snap.state, CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_probe_frees_slot() {
        let cb = breaker(1, 100);
        let exec = ResilientExecutor::with_classifier("test", AlwaysRetry);
        let calls = AtomicU32::new(0);

        fail_once(&cb, &exec, &calls).await;
        tokio::time::advance(Duration::from_millis(100)).await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = cb
            .execute_cancellable(&exec, &policy(1), &cancel, || async { Ok::<_, String>(()) })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.snapshot().consecutive_failures, 1);

        // The next caller becomes the probe.
        cb.execute(&exec, &policy(1), || async { Ok::<_, String>(()) })
            .await
            .unwrap();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_probe_frees_slot() {
        let cb = breaker(1, 100);
        let exec = ResilientExecutor::with_classifier("test", AlwaysRetry);
        let calls = AtomicU32::new(0);

        fail_once(&cb, &exec, &calls).await;
        tokio::time::advance(Duration::from_millis(100)).await;

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            cb.execute(&exec, &policy(1), || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, String>(())
            }),
        )
        .await;
        assert!(abandoned.is_err());
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        cb.execute(&exec, &policy(1), || async { Ok::<_, String>(()) })
            .await
            .unwrap();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_straggler_success_does_not_close() {
        let cb = Arc::new(breaker(1, 1000));
        let exec = Arc::new(ResilientExecutor::with_classifier("test", AlwaysRetry));

        let slow = {
            let cb = Arc::clone(&cb);
            let exec = Arc::clone(&exec);
            tokio::spawn(async move {
                cb.execute(&exec, &policy(1), || async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, String>(())
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        let calls = AtomicU32::new(0);
        fail_once(&cb, &exec, &calls).await;
        assert_eq!(cb.state(), CircuitState::Open);

        slow.await.unwrap().unwrap();
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_straggler_success_during_half_open_resets_failures() {
        let cb = Arc::new(breaker(1, 100));
        let exec = Arc::new(ResilientExecutor::with_classifier("test", AlwaysRetry));

        let slow = {
            let cb = Arc::clone(&cb);
            let exec = Arc::clone(&exec);
            tokio::spawn(async move {
                cb.execute(&exec, &policy(1), || async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok::<_, String>(())
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        let calls = AtomicU32::new(0);
        fail_once(&cb, &exec, &calls).await;
        assert_eq!(cb.state(), CircuitState::Open);
        tokio::time::advance(Duration::from_millis(100)).await;

        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let trial = {
            let cb = Arc::clone(&cb);
            let exec = Arc::clone(&exec);
            let mut started_tx = Some(started_tx);
            let mut release_rx = Some(release_rx);
            tokio::spawn(async move {
                cb.execute(&exec, &policy(1), || {
                    let started = started_tx.take();
                    let release = release_rx.take();
                    async move {
                        if let Some(tx) = started {
                            let _ = tx.send(());
                        }
                        if let Some(rx) = release {
                            let _ = rx.await;
                        }
                        Ok::<_, String>(())
                    }
                })
                .await
            })
        };
        started_rx.await.unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.snapshot().consecutive_failures, 1);

        slow.await.unwrap().unwrap();
        let snap = cb.snapshot();
        assert_eq!(snap.state, CircuitState::HalfOpen, "only the trial call closes the circuit");
        assert_eq!(snap.consecutive_failures, 0);

        release_tx.send(()).unwrap();
        trial.await.unwrap().unwrap();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_poisoned_state_is_fatal_to_call() {
        let cb = breaker(1, 100);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = cb.inner.lock().unwrap();
            panic!("poison the breaker");
        }));

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let exec = ResilientExecutor::with_classifier("test", AlwaysRetry);
        let err = rt
            .block_on(cb.execute(&exec, &policy(1), || async { Ok::<_, String>(()) }))
            .unwrap_err();
        assert!(matches!(err, ExecutorError::BreakerUnavailable(_)));

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        rt.block_on(cb.execute(&exec, &policy(1), || async { Ok::<_, String>(()) }))
            .unwrap();
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            CircuitBreakerConfig::new(0, Duration::from_secs(1)),
            Err(PolicyError::InvalidFailureThreshold(0))
        );
        assert_eq!(
            CircuitBreakerConfig::new(3, Duration::ZERO),
            Err(PolicyError::ZeroResetTimeout)
        );
        assert_eq!(
            CircuitBreakerConfig::violations(0, Duration::ZERO),
            vec![PolicyError::InvalidFailureThreshold(0), PolicyError::ZeroResetTimeout]
        );
        let config = BreakerConfig {
            enabled: true,
            failure_threshold: 4,
            reset_timeout_ms: 2500,
        };
        let parsed = CircuitBreakerConfig::try_from(&config).unwrap();
        assert_eq!(parsed.failure_threshold(), 4);
        assert_eq!(parsed.reset_timeout(), Duration::from_millis(2500));
    }
}
