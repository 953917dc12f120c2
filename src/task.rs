//! Task identity, lifecycle status, and outcome types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WorkFailure;

/// Opaque unique handle for a submitted task.
///
/// Generated at submission (UUIDv4) and never reused. Once the record is
/// consumed by a successful wait, abandoned by a timed-out wait, or purged
/// by the stale reaper, queries on the id report the task as unknown.
///
/// # Examples
///
/// ```
/// use convq::TaskQueue;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let queue = TaskQueue::new();
/// let a = queue.submit(|| 1).unwrap();
/// let b = queue.submit(|| 2).unwrap();
/// assert_ne!(a, b);
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Task lifecycle status.
///
/// Transitions are monotonic: `Waiting -> Processing -> Completed`, with no
/// backward or self transitions. `Completed` is terminal. At most one task
/// is `Processing` at any instant because a single worker performs all
/// transitions.
///
/// # Examples
///
/// ```
/// use convq::TaskStatus;
///
/// assert!(TaskStatus::Waiting.can_transition_to(&TaskStatus::Processing));
/// assert!(!TaskStatus::Processing.can_transition_to(&TaskStatus::Waiting));
/// assert!(TaskStatus::Completed.is_terminal());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Enqueued, not yet picked up by the worker.
    Waiting,
    /// The worker is running this task's work function.
    Processing,
    /// The work function returned (or panicked); the outcome is recorded.
    Completed,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl TaskStatus {
    /// Returns `true` if this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns `true` if transitioning from this status to `next` is valid.
    ///
    /// Only the two forward steps are allowed; backward and self transitions
    /// are rejected.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::Waiting, Self::Processing) | (Self::Processing, Self::Completed)
        )
    }
}

/// The recorded result of a finished task.
///
/// `Ok` holds whatever the work function returned -- which may itself encode
/// partial per-item failures; the queue does not interpret it. `Err` means
/// the work function panicked and the panic was converted into a terminal
/// outcome by the worker.
pub type TaskOutcome<R> = Result<R, WorkFailure>;
