//! The single background worker: sole consumer of the submission channel.
//!
//! Exactly one worker runs per queue, so at most one work function executes
//! at any instant and tasks begin processing in strict submission order.
//! Stale-record reaping piggybacks on idle poll timeouts instead of running
//! on its own timer.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::WorkFailure;
use crate::queue::Shared;
use crate::task::TaskId;

pub(crate) async fn run<R: Send + 'static>(
    shared: Arc<Shared<R>>,
    mut rx: UnboundedReceiver<TaskId>,
) {
    loop {
        match timeout(shared.config.idle_poll, rx.recv()).await {
            Ok(Some(id)) => process(&shared, id).await,
            Ok(None) => {
                debug!("submission channel closed, worker exiting");
                break;
            }
            Err(_) => {
                let reaped = shared.registry.lock().reap_stale(&shared.config);
                if reaped > 0 {
                    debug!(reaped, "purged stale task records");
                }
            }
        }
    }
}

/// Runs one task to completion. The work function executes on the blocking
/// pool, outside the registry lock, so queries and submissions stay
/// responsive while a conversion is in flight.
async fn process<R: Send + 'static>(shared: &Arc<Shared<R>>, id: TaskId) {
    let Some(work) = shared.registry.lock().begin(id) else {
        trace!(task = %id, "task gone before processing, skipping");
        return;
    };

    debug!(task = %id, "processing task");
    let outcome = match tokio::task::spawn_blocking(work).await {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(task = %id, "work function panicked");
            Err(WorkFailure::from_join(err))
        }
    };

    if shared.registry.lock().complete(id, outcome) {
        trace!(task = %id, "task completed");
    } else {
        debug!(task = %id, "task abandoned by its waiter, result discarded");
    }
}
