//! Property-based tests over the public types and queue invariants.
//!
//! Verifies state machine monotonicity under arbitrary status pairs, serde
//! round-trip stability for ids and statuses, and FIFO position accounting
//! for arbitrary submission counts against a gated worker.

use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use proptest::prelude::*;

use convq::{TaskQueue, TaskStatus};

fn arb_status() -> impl Strategy<Value = TaskStatus> {
    prop::sample::select(vec![
        TaskStatus::Waiting,
        TaskStatus::Processing,
        TaskStatus::Completed,
    ])
}

proptest! {
    /// The terminal state rejects every transition.
    #[test]
    fn completed_rejects_all_transitions(to in arb_status()) {
        prop_assert!(!TaskStatus::Completed.can_transition_to(&to));
    }

    /// No status transitions to itself.
    #[test]
    fn self_transitions_rejected(status in arb_status()) {
        prop_assert!(!status.can_transition_to(&status));
    }

    /// Transitions are antisymmetric: if a -> b is valid, b -> a is not.
    #[test]
    fn transitions_are_one_way(a in arb_status(), b in arb_status()) {
        prop_assert!(!(a.can_transition_to(&b) && b.can_transition_to(&a)));
    }

    /// Status serde round-trips through JSON.
    #[test]
    fn status_serde_round_trip(status in arb_status()) {
        let json = serde_json::to_value(status).unwrap();
        let back: TaskStatus = serde_json::from_value(json).unwrap();
        prop_assert_eq!(status, back);
    }

    /// Arbitrary status JSON strings never panic the deserializer.
    #[test]
    fn status_deserialization_never_panics(input in "[a-z_]{0,20}") {
        let _ = serde_json::from_value::<TaskStatus>(serde_json::Value::String(input));
    }
}

proptest! {
    // Each case spins up a runtime and a live worker; keep the case count low.
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// With the worker gated on a blocker task, n submissions occupy
    /// positions 1..=n in submission order.
    #[test]
    fn positions_are_dense_and_ordered(n in 1usize..12) {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async move {
            let queue = TaskQueue::new();
            let (release, gate) = std_mpsc::channel::<()>();
            let blocker = queue
                .submit(move || {
                    gate.recv().ok();
                    0usize
                })
                .unwrap();

            // Make sure the blocker has been dequeued before measuring.
            while queue.status(blocker) != Some(TaskStatus::Processing) {
                tokio::time::sleep(Duration::from_millis(2)).await;
            }

            let ids: Vec<_> = (0..n).map(|i| queue.submit(move || i).unwrap()).collect();
            for (index, id) in ids.iter().enumerate() {
                prop_assert_eq!(queue.position(*id), index + 1);
            }
            prop_assert_eq!(queue.waiting_len(), n);

            release.send(()).unwrap();
            for id in ids {
                prop_assert!(queue.wait(id, Duration::from_secs(10)).await.is_some());
            }
            queue.shutdown().await;
            Ok(())
        })?;
    }
}
