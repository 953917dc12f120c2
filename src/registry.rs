//! Task registry: the id -> record map plus the FIFO waiting order.
//!
//! All structural mutation (insert, dequeue, remove, reap) and all record
//! field writes happen through `&mut Registry`, which the queue guards with
//! a single `parking_lot::Mutex`. Putting status and outcome writes under
//! the same lock keeps the record state unambiguous even though only the
//! worker ever performs transitions.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Notify;

use crate::config::QueueConfig;
use crate::task::{TaskId, TaskOutcome, TaskStatus};

/// Type-erased work function, executed exactly once by the worker.
pub(crate) type WorkFn<R> = Box<dyn FnOnce() -> R + Send + 'static>;

/// One submitted unit of work and its lifecycle state.
pub(crate) struct TaskRecord<R> {
    status: TaskStatus,
    /// Taken by the worker at dequeue; `None` afterwards.
    work: Option<WorkFn<R>>,
    outcome: Option<TaskOutcome<R>>,
    created_at: Instant,
    completed_at: Option<Instant>,
    /// Wakes the waiter when the task completes or the record is reaped.
    notify: Arc<Notify>,
}

/// What a waiter finds when it tries to consume a task's result.
pub(crate) enum Claim<R> {
    /// The task completed; the record has been removed and its outcome
    /// handed over.
    Ready(TaskOutcome<R>),
    /// The task is still waiting or processing; await this handle and
    /// re-check.
    Pending(Arc<Notify>),
    /// No record for this id.
    Unknown,
}

pub(crate) struct Registry<R> {
    tasks: HashMap<TaskId, TaskRecord<R>>,
    /// Ids of `Waiting` tasks in submission order. Membership invariant:
    /// an id is in this list iff its record's status is `Waiting`.
    order: VecDeque<TaskId>,
}

impl<R> Registry<R> {
    pub(crate) fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    /// Inserts a fresh `Waiting` record and returns its new unique id.
    pub(crate) fn insert(&mut self, work: WorkFn<R>) -> TaskId {
        let id = TaskId::generate();
        self.tasks.insert(
            id,
            TaskRecord {
                status: TaskStatus::Waiting,
                work: Some(work),
                outcome: None,
                created_at: Instant::now(),
                completed_at: None,
                notify: Arc::new(Notify::new()),
            },
        );
        self.order.push_back(id);
        id
    }

    /// 1-based position in the waiting line; 0 when the task is unknown or
    /// no longer `Waiting`.
    pub(crate) fn position(&self, id: TaskId) -> usize {
        self.order
            .iter()
            .position(|queued| *queued == id)
            .map_or(0, |index| index + 1)
    }

    pub(crate) fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.tasks.get(&id).map(|record| record.status)
    }

    pub(crate) fn waiting_len(&self) -> usize {
        self.order.len()
    }

    /// Marks a dequeued task `Processing`, drops it from the waiting order,
    /// and hands its work function to the worker. Returns `None` when the
    /// record was removed (reaped or abandoned) between enqueue and dequeue.
    pub(crate) fn begin(&mut self, id: TaskId) -> Option<WorkFn<R>> {
        let record = self.tasks.get_mut(&id)?;
        debug_assert!(record.status.can_transition_to(&TaskStatus::Processing));
        record.status = TaskStatus::Processing;
        self.order.retain(|queued| *queued != id);
        record.work.take()
    }

    /// Records the outcome of a finished task and wakes its waiter.
    /// Returns `false` when the record is already gone (the waiter timed
    /// out and abandoned it); the outcome is then discarded by the caller.
    pub(crate) fn complete(&mut self, id: TaskId, outcome: TaskOutcome<R>) -> bool {
        let Some(record) = self.tasks.get_mut(&id) else {
            return false;
        };
        debug_assert!(record.status.can_transition_to(&TaskStatus::Completed));
        record.status = TaskStatus::Completed;
        record.outcome = Some(outcome);
        record.completed_at = Some(Instant::now());
        record.notify.notify_one();
        true
    }

    /// Attempts to consume a task's result. Consuming removes the record,
    /// so a result is delivered at most once.
    pub(crate) fn claim(&mut self, id: TaskId) -> Claim<R> {
        let Some(record) = self.tasks.get(&id) else {
            return Claim::Unknown;
        };
        if record.status != TaskStatus::Completed {
            return Claim::Pending(Arc::clone(&record.notify));
        }
        match self.tasks.remove(&id).and_then(|record| record.outcome) {
            Some(outcome) => Claim::Ready(outcome),
            // A completed record always carries an outcome; a missing one
            // is indistinguishable from an already-consumed record.
            None => Claim::Unknown,
        }
    }

    /// Removes a record unconditionally (wait timeout / abandonment).
    /// The worker may still be running the work function; its eventual
    /// outcome will be discarded by [`complete`](Self::complete).
    pub(crate) fn remove(&mut self, id: TaskId) -> bool {
        let removed = self.tasks.remove(&id).is_some();
        if removed {
            self.order.retain(|queued| *queued != id);
        }
        removed
    }

    /// Purges stale records: `Waiting` ones past the abandonment threshold
    /// and `Completed` ones past the retention threshold. `Processing`
    /// records are never reaped. Waiters on purged records are woken so
    /// they observe "unknown" instead of sleeping out their full budget.
    pub(crate) fn reap_stale(&mut self, config: &QueueConfig) -> usize {
        let stale: Vec<TaskId> = self
            .tasks
            .iter()
            .filter_map(|(id, record)| {
                let expired = match record.status {
                    TaskStatus::Waiting => record.created_at.elapsed() > config.abandon_after,
                    TaskStatus::Completed => record
                        .completed_at
                        .is_some_and(|at| at.elapsed() > config.retain_completed_for),
                    TaskStatus::Processing => false,
                };
                expired.then_some(*id)
            })
            .collect();

        for id in &stale {
            if let Some(record) = self.tasks.remove(id) {
                record.notify.notify_one();
            }
            self.order.retain(|queued| queued != id);
        }
        stale.len()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Test hook: rewrites a record's timestamps as if it were `age` old.
    #[cfg(test)]
    pub(crate) fn backdate(&mut self, id: TaskId, age: std::time::Duration) {
        let past = Instant::now()
            .checked_sub(age)
            .expect("age within Instant range");
        if let Some(record) = self.tasks.get_mut(&id) {
            record.created_at = past;
            if record.completed_at.is_some() {
                record.completed_at = Some(past);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use super::*;

    fn registry_with(n: usize) -> (Registry<u32>, Vec<TaskId>) {
        let mut registry = Registry::new();
        let ids = (0..n)
            .map(|i| registry.insert(Box::new(move || i as u32)))
            .collect();
        (registry, ids)
    }

    #[test]
    fn insert_assigns_fifo_positions() {
        let (registry, ids) = registry_with(3);
        assert_eq!(registry.position(ids[0]), 1);
        assert_eq!(registry.position(ids[1]), 2);
        assert_eq!(registry.position(ids[2]), 3);
        assert_eq!(registry.waiting_len(), 3);
    }

    #[test]
    fn position_is_zero_for_unknown_id() {
        let (registry, _) = registry_with(1);
        assert_eq!(registry.position(TaskId::generate()), 0);
    }

    #[test]
    fn begin_dequeues_and_shifts_positions() {
        let (mut registry, ids) = registry_with(3);
        let work = registry.begin(ids[0]).expect("work function present");
        assert_eq!(work(), 0);

        assert_eq!(registry.status(ids[0]), Some(TaskStatus::Processing));
        assert_eq!(registry.position(ids[0]), 0);
        assert_eq!(registry.position(ids[1]), 1);
        assert_eq!(registry.position(ids[2]), 2);
    }

    #[test]
    fn begin_on_removed_task_returns_none() {
        let (mut registry, ids) = registry_with(1);
        registry.remove(ids[0]);
        assert!(registry.begin(ids[0]).is_none());
    }

    #[test]
    fn complete_records_outcome_and_claim_consumes_it() {
        let (mut registry, ids) = registry_with(1);
        let _ = registry.begin(ids[0]);
        assert!(registry.complete(ids[0], Ok(7)));

        assert_eq!(registry.status(ids[0]), Some(TaskStatus::Completed));
        match registry.claim(ids[0]) {
            Claim::Ready(outcome) => assert_eq!(outcome.unwrap(), 7),
            _ => panic!("expected Ready"),
        }
        // Consumed: gone for good.
        assert!(registry.status(ids[0]).is_none());
        assert!(matches!(registry.claim(ids[0]), Claim::Unknown));
    }

    #[test]
    fn complete_after_removal_reports_discard() {
        let (mut registry, ids) = registry_with(1);
        let _ = registry.begin(ids[0]);
        registry.remove(ids[0]);
        assert!(!registry.complete(ids[0], Ok(7)));
    }

    #[test]
    fn claim_on_unfinished_task_is_pending() {
        let (mut registry, ids) = registry_with(1);
        assert!(matches!(registry.claim(ids[0]), Claim::Pending(_)));
        let _ = registry.begin(ids[0]);
        assert!(matches!(registry.claim(ids[0]), Claim::Pending(_)));
    }

    #[test]
    fn reap_purges_old_waiting_records() {
        let config = QueueConfig::default().with_abandon_after(Duration::from_secs(600));
        let (mut registry, ids) = registry_with(2);
        registry.backdate(ids[0], Duration::from_secs(700));

        assert_eq!(registry.reap_stale(&config), 1);
        assert!(registry.status(ids[0]).is_none());
        assert_eq!(registry.status(ids[1]), Some(TaskStatus::Waiting));
        assert_eq!(registry.position(ids[1]), 1);
    }

    #[test]
    fn reap_purges_old_completed_records() {
        let config = QueueConfig::default().with_retain_completed_for(Duration::from_secs(3600));
        let (mut registry, ids) = registry_with(1);
        let _ = registry.begin(ids[0]);
        registry.complete(ids[0], Ok(1));
        registry.backdate(ids[0], Duration::from_secs(4000));

        assert_eq!(registry.reap_stale(&config), 1);
        assert!(registry.status(ids[0]).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn reap_keeps_fresh_and_processing_records() {
        let config = QueueConfig::default()
            .with_abandon_after(Duration::from_secs(600))
            .with_retain_completed_for(Duration::from_secs(3600));
        let (mut registry, ids) = registry_with(2);
        let _ = registry.begin(ids[0]);
        // ids[0] is Processing and very old; still never reaped.
        registry.backdate(ids[0], Duration::from_secs(10_000));

        assert_eq!(registry.reap_stale(&config), 0);
        assert_eq!(registry.len(), 2);
    }

    proptest! {
        /// The waiting order always contains exactly the `Waiting` records,
        /// in submission order, whatever interleaving of dequeues and
        /// removals happens.
        #[test]
        fn order_list_matches_waiting_records(ops in prop::collection::vec(0usize..4, 1..40)) {
            let mut registry: Registry<u32> = Registry::new();
            let mut ids: Vec<TaskId> = Vec::new();

            for op in ops {
                match op {
                    0 => ids.push(registry.insert(Box::new(|| 0))),
                    1 => {
                        // Dequeue the head of the line, as the worker would.
                        if let Some(&head) = ids.iter().find(|id| registry.position(**id) == 1) {
                            let _ = registry.begin(head);
                        }
                    }
                    2 => {
                        if let Some(&id) = ids.first() {
                            registry.remove(id);
                        }
                    }
                    _ => {
                        if let Some(&id) = ids.last() {
                            registry.remove(id);
                        }
                    }
                }

                let waiting: Vec<TaskId> = ids
                    .iter()
                    .copied()
                    .filter(|id| registry.status(*id) == Some(TaskStatus::Waiting))
                    .collect();
                let ordered: Vec<TaskId> =
                    (1..=registry.waiting_len())
                        .filter_map(|pos| {
                            ids.iter().copied().find(|id| registry.position(*id) == pos)
                        })
                        .collect();
                prop_assert_eq!(&waiting, &ordered);
                prop_assert_eq!(waiting.len(), registry.waiting_len());
            }
        }
    }
}
