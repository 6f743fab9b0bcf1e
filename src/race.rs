//! Await-first racing between an in-flight operation and a deadline.
//!
//! The orchestrator never cancels a store operation: when a deadline fires
//! first, the losing operation is *abandoned*. It keeps executing inside the
//! scheduler, consumes its remaining simulated time and releases any
//! resources it holds; only its eventual result is discarded. This module
//! makes that distinction explicit in the types.

use tokio::task::JoinHandle;

use crate::{
    error::{SimulationError, SimulationResult},
    sleep::SleepFuture,
};

/// An operation that lost a race against its deadline.
///
/// Wraps the live join handle of the still-running task. Callers
/// acknowledge the abandonment by calling [`detach`](Self::detach); dropping
/// a tokio join handle detaches the task without aborting it, so the
/// operation runs to completion and its cleanup (pool release, map access)
/// still happens.
#[derive(Debug)]
pub struct AbandonedOperation<T> {
    handle: JoinHandle<T>,
}

impl<T> AbandonedOperation<T> {
    /// Discard the operation's eventual result without stopping it.
    pub fn detach(self) {
        drop(self.handle);
    }
}

/// Winner of a race between an operation and its deadline.
#[derive(Debug)]
pub enum RaceWinner<T> {
    /// The operation settled before the deadline fired.
    Operation(T),
    /// The deadline fired first; the loser keeps running inside the
    /// scheduler and is handed back for explicit detachment.
    DeadlineElapsed(AbandonedOperation<T>),
}

/// Suspend until the first of `operation` and `deadline` settles.
///
/// The operation must already be spawned so that losing the race leaves it
/// running inside the scheduler. The select is biased towards the operation:
/// when both sides become ready within a single poll, an operation that
/// completed exactly at the deadline counts as completed. Ties across polls
/// are resolved by the event queue's FIFO order.
pub async fn race<T>(
    mut operation: JoinHandle<T>,
    deadline: SleepFuture,
) -> SimulationResult<RaceWinner<T>> {
    tokio::select! {
        biased;

        joined = &mut operation => match joined {
            Ok(value) => Ok(RaceWinner::Operation(value)),
            Err(_) => Err(SimulationError::InvalidState(
                "raced operation panicked".to_string(),
            )),
        },
        elapsed = deadline => {
            elapsed?;
            tracing::trace!("deadline elapsed, abandoning in-flight operation");
            Ok(RaceWinner::DeadlineElapsed(AbandonedOperation {
                handle: operation,
            }))
        }
    }
}
