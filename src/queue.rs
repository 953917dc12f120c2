//! The public task queue: submission, position/status queries, result
//! waiting, and lifecycle.
//!
//! A [`TaskQueue`] is explicitly constructed and owned by the host
//! application -- there is no global instance. Construction spawns the
//! single worker task; [`shutdown`](TaskQueue::shutdown) drains whatever is
//! already queued and joins the worker.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::timeout_at;
use tracing::trace;

use crate::config::QueueConfig;
use crate::error::QueueError;
use crate::registry::{Claim, Registry};
use crate::task::{TaskId, TaskOutcome, TaskStatus};
use crate::worker;

/// State shared between the queue handle and its worker.
pub(crate) struct Shared<R> {
    pub(crate) registry: Mutex<Registry<R>>,
    pub(crate) config: QueueConfig,
}

/// A FIFO task queue executing work functions one at a time on a single
/// background worker.
///
/// The queue exists to serialize access to a resource that must not be used
/// concurrently, such as a lone document-conversion engine process. Work
/// functions are opaque to the queue: callers move their payload into the
/// closure and encode any internal failure in the returned value.
///
/// Share the queue across callers behind an `Arc`. Constructing a queue
/// spawns its worker, so it must happen inside a tokio runtime.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use convq::TaskQueue;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let queue = TaskQueue::new();
///
/// let id = queue.submit(|| "converted".to_string()).unwrap();
/// assert!(queue.position(id) <= 1);
///
/// let outcome = queue.wait(id, Duration::from_secs(5)).await.unwrap();
/// assert_eq!(outcome.unwrap(), "converted");
/// # });
/// ```
pub struct TaskQueue<R> {
    shared: Arc<Shared<R>>,
    /// `None` after shutdown; dropping the sender is what stops the worker.
    tx: Mutex<Option<UnboundedSender<TaskId>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<R: Send + 'static> TaskQueue<R> {
    /// Creates a queue with [`QueueConfig::default`] and spawns its worker.
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    /// Creates a queue with the given configuration and spawns its worker.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use convq::{QueueConfig, TaskQueue};
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let queue = TaskQueue::<u64>::with_config(
    ///     QueueConfig::default().with_abandon_after(Duration::from_secs(60)),
    /// );
    /// queue.shutdown().await;
    /// # });
    /// ```
    pub fn with_config(config: QueueConfig) -> Self {
        let shared = Arc::new(Shared {
            registry: Mutex::new(Registry::new()),
            config,
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(worker::run(Arc::clone(&shared), rx));

        Self {
            shared,
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Submits a unit of work and returns its id immediately.
    ///
    /// Never blocks on execution: the record is registered as `Waiting` and
    /// the id handed to the worker over the FIFO channel. The work function
    /// runs on the blocking pool, so it may block freely (subprocess calls,
    /// file I/O). A panic inside it is recorded as an
    /// [`Err(WorkFailure)`](crate::WorkFailure) outcome.
    ///
    /// # Errors
    ///
    /// [`QueueError::Closed`] once [`shutdown`](Self::shutdown) has begun.
    pub fn submit<F>(&self, work: F) -> Result<TaskId, QueueError>
    where
        F: FnOnce() -> R + Send + 'static,
    {
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return Err(QueueError::Closed);
        };

        let id = self.shared.registry.lock().insert(Box::new(work));
        if tx.send(id).is_err() {
            // Worker already gone (runtime teardown); don't leak the record.
            self.shared.registry.lock().remove(id);
            return Err(QueueError::Closed);
        }
        trace!(task = %id, "task submitted");
        Ok(id)
    }

    /// 1-based position of the task in the waiting line.
    ///
    /// Returns 0 when the task is unknown or no longer `Waiting` (it is
    /// processing, completed, or already gone).
    pub fn position(&self, id: TaskId) -> usize {
        self.shared.registry.lock().position(id)
    }

    /// Current status, or `None` when the id is unknown.
    pub fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.shared.registry.lock().status(id)
    }

    /// Number of tasks still waiting to be dequeued.
    pub fn waiting_len(&self) -> usize {
        self.shared.registry.lock().waiting_len()
    }

    /// Blocks until the task completes or `budget` elapses, then consumes
    /// the record.
    ///
    /// - Completed within budget: returns `Some(outcome)` and removes the
    ///   record, so a second `wait` on the same id returns `None` and
    ///   [`status`](Self::status) reports unknown (at-most-once delivery).
    /// - Budget elapsed: removes the record anyway and returns `None`. The
    ///   worker may still be running the work function; its late result is
    ///   discarded.
    /// - Unknown id: returns `None` immediately.
    ///
    /// Completion is signaled per task, so waiters wake promptly instead of
    /// polling on an interval.
    pub async fn wait(&self, id: TaskId, budget: Duration) -> Option<TaskOutcome<R>> {
        let deadline = tokio::time::Instant::now() + budget;
        loop {
            let notify = match self.shared.registry.lock().claim(id) {
                Claim::Ready(outcome) => return Some(outcome),
                Claim::Unknown => return None,
                Claim::Pending(notify) => notify,
            };

            if timeout_at(deadline, notify.notified()).await.is_err() {
                // Budget exhausted: abandon the record. The work function is
                // not interrupted; a late completion finds nothing to update.
                self.shared.registry.lock().remove(id);
                return None;
            }
        }
    }

    /// Stops accepting submissions, lets the worker drain everything already
    /// queued, and joins it.
    ///
    /// Results of drained tasks remain collectable via
    /// [`wait`](Self::wait) until reaped -- but note that with the worker
    /// stopped, no further reaping occurs. Idempotent.
    pub async fn shutdown(&self) {
        self.tx.lock().take();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl<R: Send + 'static> Default for TaskQueue<R> {
    fn default() -> Self {
        Self::new()
    }
}
