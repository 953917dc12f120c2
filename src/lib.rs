//! Single-worker task queue for a scarce, stateful conversion engine.
//!
//! `convq` serializes access to an external resource that is not safe for
//! concurrent use (the motivating case is a single headless document-conversion
//! engine process). Many independent callers submit units of work; exactly one
//! background worker executes them, one at a time, in strict submission order.
//!
//! # Overview
//!
//! A submitted task moves through a small monotonic state machine
//! (`Waiting` -> `Processing` -> `Completed`). Callers get an opaque
//! [`TaskId`] back immediately and can:
//!
//! - poll their [`position`](TaskQueue::position) in the waiting line,
//! - check [`status`](TaskQueue::status),
//! - [`wait`](TaskQueue::wait) with a timeout for the result.
//!
//! Results are delivered at most once: a successful `wait` consumes the task
//! record, and any later query on that id reports the task as unknown.
//! Abandoned records (a waiter that never came back, or a result nobody
//! collected) are purged by a stale reaper that runs whenever the worker
//! finds the queue idle.
//!
//! A work function that panics does not wedge the queue: the panic is caught
//! at the join boundary and recorded as an [`Err(WorkFailure)`](WorkFailure)
//! outcome, so the task still completes and its waiter is woken.
//!
//! # Module Organization
//!
//! - [`queue`] - The public [`TaskQueue`]: submission, queries, waiting,
//!   shutdown.
//! - [`task`] - Task identity, lifecycle status, and outcome types.
//! - [`config`] - Tuning knobs (idle poll interval, staleness thresholds).
//! - [`error`] - Error types.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use convq::TaskQueue;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let queue = TaskQueue::new();
//!
//! // The payload is moved into the work function; the queue never
//! // inspects either.
//! let payload = 21;
//! let id = queue.submit(move || payload * 2).unwrap();
//!
//! let outcome = queue.wait(id, Duration::from_secs(5)).await;
//! assert_eq!(outcome.unwrap().unwrap(), 42);
//!
//! // The record was consumed; the id is unknown from here on.
//! assert!(queue.status(id).is_none());
//!
//! queue.shutdown().await;
//! # });
//! ```

pub mod config;
pub mod error;
pub mod queue;
pub mod task;

mod registry;
mod worker;

pub use config::QueueConfig;
pub use error::{QueueError, WorkFailure};
pub use queue::TaskQueue;
pub use task::{TaskId, TaskOutcome, TaskStatus};
