//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap each attempt with an optional deadline
//! - Cancel the attempt cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the timed-out future is dropped
//! - Timeout errors are distinct from operation errors (`AttemptError::TimedOut`)
//! - How a timeout is classified is decided by the executor, not here

use std::future::Future;
use std::time::Duration;

use crate::resilience::error::AttemptError;

/// Run one attempt, enforcing `limit` when present.
pub async fn run_attempt<T, E, Fut>(limit: Option<Duration>, attempt: Fut) -> Result<T, AttemptError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, attempt).await {
            Ok(result) => result.map_err(AttemptError::Operation),
            Err(_) => Err(AttemptError::TimedOut(limit)),
        },
        None => attempt.await.map_err(AttemptError::Operation),
    }
}
