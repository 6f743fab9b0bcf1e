//! Request stream generation and outcome recording.

use std::{cell::RefCell, rc::Rc, time::Duration};

use crate::{
    always_assert,
    config::{ArrivalProcess, GeneratorConfig},
    error::SimulationResult,
    orchestrator::Orchestrator,
    request::{Outcome, OutcomeStatus, Request, RequestId, RequestKind},
    rng::{sim_random, sim_random_bool, sim_random_range},
    sim::WeakSimWorld,
};

/// Shared, append-only log of terminal outcomes for one run.
pub type OutcomeLog = Rc<RefCell<Vec<Outcome>>>;

/// Produces the request stream, drives each request through the orchestrator
/// in its own task, and records outcomes.
///
/// Reads only ever target ids with a confirmed end-to-end write: the
/// written-id set is consulted at issue time and a write is forced while it
/// is empty. Each spawned request task appends exactly one [`Outcome`] and,
/// for a write that came back `OK`, adds its id to the written set.
pub struct RequestGenerator {
    sim: WeakSimWorld,
    orchestrator: Rc<Orchestrator>,
    config: GeneratorConfig,
    log: OutcomeLog,
    written_ids: Rc<RefCell<Vec<RequestId>>>,
}

impl RequestGenerator {
    /// Creates a generator writing into `log`.
    pub fn new(
        sim: WeakSimWorld,
        orchestrator: Rc<Orchestrator>,
        config: GeneratorConfig,
        log: OutcomeLog,
    ) -> Self {
        Self {
            sim,
            orchestrator,
            config,
            log,
            written_ids: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Emit `request_count` requests on the configured cadence, then wait for
    /// every in-flight request to reach its terminal outcome.
    pub async fn run(self) -> SimulationResult<()> {
        let mut tasks = Vec::with_capacity(self.config.request_count);

        for sequence in 0..self.config.request_count {
            let request = self.issue_request(sequence as RequestId)?;
            tracing::debug!(
                id = request.id,
                kind = %request.kind,
                at = ?request.arrival_time,
                "request issued"
            );

            let orchestrator = self.orchestrator.clone();
            let log = self.log.clone();
            let written_ids = self.written_ids.clone();
            let sim = self.sim.clone();
            tasks.push(tokio::task::spawn_local(async move {
                let status = orchestrator.process(&request).await?;
                let end_time = sim.now()?;

                if request.kind == RequestKind::Write && status == OutcomeStatus::Ok {
                    written_ids.borrow_mut().push(request.id);
                }

                log.borrow_mut().push(Outcome {
                    kind: request.kind,
                    id: request.id,
                    status,
                    start_time: request.arrival_time,
                    end_time,
                    duration: end_time - request.arrival_time,
                });
                Ok(())
            }));

            // Gap to the next arrival; the final request is not followed by
            // a trailing wait.
            if sequence + 1 < self.config.request_count {
                let gap = self.interarrival_gap();
                self.sim.sleep(gap)?.await?;
            }
        }

        for task in tasks {
            match task.await {
                Ok(result) => result?,
                Err(_) => {
                    return Err(crate::error::SimulationError::InvalidState(
                        "request task panicked".to_string(),
                    ))
                }
            }
        }

        Ok(())
    }

    /// Decide the next request's kind and target at issue time.
    fn issue_request(&self, sequence: RequestId) -> SimulationResult<Request> {
        let arrival_time = self.sim.now()?;
        let wants_read = sim_random_bool(self.config.read_probability);
        let written = self.written_ids.borrow();

        if wants_read && !written.is_empty() {
            let target = written[sim_random_range(0..written.len())];
            always_assert!(
                read_targets_written_id,
                written.contains(&target),
                "read requests must target a previously written id"
            );
            Ok(Request {
                id: target,
                kind: RequestKind::Read,
                payload: None,
                arrival_time,
            })
        } else {
            // Writes are forced while nothing has been written yet, so reads
            // never chase ids that cannot exist.
            Ok(Request {
                id: sequence,
                kind: RequestKind::Write,
                payload: Some(format!("payload-{sequence}")),
                arrival_time,
            })
        }
    }

    /// Draw the gap to the next arrival from the configured process.
    fn interarrival_gap(&self) -> Duration {
        let secs = match self.config.arrival_process {
            ArrivalProcess::Fixed => self.config.mean_interarrival,
            ArrivalProcess::Poisson => {
                // Inverse-CDF exponential draw on the deterministic stream.
                let uniform: f64 = sim_random();
                -self.config.mean_interarrival * (1.0 - uniform).ln()
            }
        };
        Duration::from_secs_f64(secs)
    }
}
