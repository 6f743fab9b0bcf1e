//! Per-request routing: fast tier first, slow tier second, each attempt
//! raced against an independent response deadline.
//!
//! The per-request state machine is
//! `PENDING → TRY_FAST → {FAST_OK | FAST_FAIL} → (write: TRY_SLOW | read:
//! TRY_FALLBACK) → {SUCCESS | ERROR(reason)}`. There are no retries and no
//! compensation: a slow-tier write failure after a successful fast-tier write
//! leaves the two stores inconsistent on purpose, and the orchestrator
//! reports the error anyway.

use std::{future::Future, time::Duration};

use crate::{
    error::SimulationResult,
    race::{race, RaceWinner},
    request::{ErrorReason, OutcomeStatus, Request, RequestKind},
    sim::WeakSimWorld,
    sometimes_assert,
    store::{FastStore, SlowStore, StoreError},
};

/// Result of one raced tier attempt.
enum Attempt<T> {
    /// The operation settled with a value before the deadline.
    Done(T),
    /// The operation settled with a store fault before the deadline.
    Failed(StoreError),
    /// The deadline elapsed; the operation was abandoned.
    TimedOut,
}

/// Routes each request through the fast store with fallback/chaining into the
/// slow store, under a caller-imposed response timeout.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    sim: WeakSimWorld,
    fast: FastStore,
    slow: SlowStore,
    response_timeout: Duration,
}

impl Orchestrator {
    /// Creates an orchestrator over the two tiers.
    pub fn new(
        sim: WeakSimWorld,
        response_timeout: Duration,
        fast: FastStore,
        slow: SlowStore,
    ) -> Self {
        Self {
            sim,
            fast,
            slow,
            response_timeout,
        }
    }

    /// Drive one request to its terminal status.
    pub async fn process(&self, request: &Request) -> SimulationResult<OutcomeStatus> {
        match request.kind {
            RequestKind::Write => self.process_write(request).await,
            RequestKind::Read => self.process_read(request).await,
        }
    }

    async fn process_write(&self, request: &Request) -> SimulationResult<OutcomeStatus> {
        let id = request.id;
        let payload = request.payload.clone().unwrap_or_default();

        let fast = self.fast.clone();
        let fast_payload = payload.clone();
        let fast_attempt = self
            .attempt(async move { fast.write(id, fast_payload).await })
            .await?;

        match fast_attempt {
            Attempt::TimedOut => {
                tracing::debug!(id, "write timed out at the fast tier");
                return Ok(OutcomeStatus::Error(ErrorReason::Timeout));
            }
            Attempt::Failed(_) => {
                // The chain stops here: the slow tier is never attempted
                // after a fast-tier write failure.
                tracing::debug!(id, "write rejected by the fast tier");
                return Ok(OutcomeStatus::Error(ErrorReason::FastFailure));
            }
            Attempt::Done(()) => {}
        }

        let slow = self.slow.clone();
        let slow_attempt = self
            .attempt(async move { slow.write(id, payload).await })
            .await?;

        match slow_attempt {
            Attempt::Done(()) => Ok(OutcomeStatus::Ok),
            Attempt::Failed(_) => {
                // The fast tier already holds the value; nothing rolls it
                // back. The stores stay inconsistent and the caller sees the
                // error.
                sometimes_assert!(
                    write_diverges_across_tiers,
                    self.fast.contains(id),
                    "slow-tier write failures leave the fast copy in place"
                );
                tracing::debug!(id, "write rejected by the slow tier");
                Ok(OutcomeStatus::Error(ErrorReason::SlowFailure))
            }
            Attempt::TimedOut => {
                tracing::debug!(id, "write timed out at the slow tier");
                Ok(OutcomeStatus::Error(ErrorReason::Timeout))
            }
        }
    }

    async fn process_read(&self, request: &Request) -> SimulationResult<OutcomeStatus> {
        let id = request.id;

        let fast = self.fast.clone();
        let fast_attempt = self.attempt(async move { fast.read(id).await }).await?;

        if let Attempt::Done(value) = fast_attempt {
            sometimes_assert!(
                read_served_by_fast_tier,
                true,
                "reads are sometimes served by the cache tier"
            );
            return Ok(OutcomeStatus::Data(value));
        }

        // Any fast-tier failure (service failure, miss, or timeout) falls
        // back to the slow tier under its own independent deadline.
        tracing::trace!(id, "read falling back to the slow tier");
        let slow = self.slow.clone();
        let slow_attempt = self.attempt(async move { slow.read(id).await }).await?;

        match slow_attempt {
            Attempt::Done(value) => {
                sometimes_assert!(
                    read_served_by_fallback,
                    true,
                    "reads are sometimes served by the fallback tier"
                );
                Ok(OutcomeStatus::Data(value))
            }
            Attempt::Failed(StoreError::NotFound(_)) => {
                Ok(OutcomeStatus::Error(ErrorReason::NotFound))
            }
            Attempt::Failed(_) => Ok(OutcomeStatus::Error(ErrorReason::SlowFailure)),
            Attempt::TimedOut => Ok(OutcomeStatus::Error(ErrorReason::Timeout)),
        }
    }

    /// Spawn one store operation as its own task and race it against a fresh
    /// response deadline.
    ///
    /// A lost race abandons the operation: the task keeps running inside the
    /// scheduler (and releases whatever it holds) while its handle is
    /// explicitly detached here.
    async fn attempt<T, F>(&self, operation: F) -> SimulationResult<Attempt<T>>
    where
        T: 'static,
        F: Future<Output = Result<T, StoreError>> + 'static,
    {
        let deadline = self.sim.sleep(self.response_timeout)?;
        let handle = tokio::task::spawn_local(operation);

        match race(handle, deadline).await? {
            RaceWinner::Operation(Ok(value)) => Ok(Attempt::Done(value)),
            RaceWinner::Operation(Err(StoreError::Simulation(e))) => Err(e),
            RaceWinner::Operation(Err(fault)) => Ok(Attempt::Failed(fault)),
            RaceWinner::DeadlineElapsed(abandoned) => {
                abandoned.detach();
                Ok(Attempt::TimedOut)
            }
        }
    }
}
