//! Error types for queue operations.
//!
//! [`QueueError`] covers queue lifecycle failures; [`WorkFailure`] is the
//! recorded outcome of a work function that panicked instead of returning.

use thiserror::Error;
use tokio::task::JoinError;

/// Errors returned by [`TaskQueue`](crate::TaskQueue) operations.
///
/// Queries on unknown task ids are not errors -- they return the `None`/`0`
/// sentinels instead. The only fallible operation is submission against a
/// queue that has been shut down.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue has been shut down and no longer accepts submissions.
    #[error("queue is shut down")]
    Closed,
}

/// A work function that panicked (or was torn down) instead of returning.
///
/// The worker catches the failure at the join boundary and records it as the
/// task's outcome, so the task still reaches `Completed` and its waiter is
/// woken with `Err(WorkFailure)`. Without this the record would sit in
/// `Processing` forever, invisible to the stale reaper.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use convq::TaskQueue;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let queue = TaskQueue::<i32>::new();
/// let id = queue.submit(|| panic!("conversion engine crashed")).unwrap();
///
/// let outcome = queue.wait(id, Duration::from_secs(5)).await.unwrap();
/// let failure = outcome.unwrap_err();
/// assert!(failure.message.contains("conversion engine crashed"));
/// # });
/// ```
#[derive(Debug, Clone, Error)]
#[error("work function panicked: {message}")]
pub struct WorkFailure {
    /// The panic payload, when it was a string; otherwise a description
    /// of how the work task ended.
    pub message: String,
}

impl WorkFailure {
    /// Builds a failure from the `spawn_blocking` join error, extracting
    /// the panic message when the payload is a string.
    pub(crate) fn from_join(err: JoinError) -> Self {
        let message = match err.try_into_panic() {
            Ok(payload) => {
                if let Some(s) = payload.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = payload.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "panic with non-string payload".to_string()
                }
            }
            Err(err) => err.to_string(),
        };
        Self { message }
    }
}
