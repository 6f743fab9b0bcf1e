//! The simulation entry point and its cooperative driver.
//!
//! Simulated concurrency is interleaved suspension, never parallelism: a
//! current-thread runtime with a `LocalSet` polls every spawned task, and the
//! driver below alternates between letting ready tasks settle and stepping
//! the virtual clock. Time only advances when nothing is runnable at the
//! current instant, which is what keeps instantaneous operations ahead of
//! their deadlines.

use std::{cell::RefCell, future::Future, rc::Rc, time::Duration};

use crate::{
    config::SimulationConfig,
    error::{SimulationError, SimulationResult},
    generator::{OutcomeLog, RequestGenerator},
    metrics::{summarize, RunSummary},
    orchestrator::Orchestrator,
    pool::ResourcePool,
    request::Outcome,
    rng::get_current_sim_seed,
    sim::SimWorld,
    store::{FastStore, SlowStore},
};

/// Yield budget used to let every ready task run before the clock moves.
///
/// Wake chains inside one virtual instant have bounded depth (race
/// resolution, pool hand-off, a follow-up spawn); each yield gives every
/// ready task another poll, so this budget is a comfortable ceiling rather
/// than a tuning knob.
const SETTLE_YIELDS: usize = 32;

/// Run one simulation with the seed carried in the configuration.
///
/// Returns the ordered outcome log (completion order) and its summary. This
/// is the crate's single entry point; configuration parsing, dashboards and
/// plotting live in external callers.
pub fn run(config: &SimulationConfig) -> SimulationResult<(Vec<Outcome>, RunSummary)> {
    run_with_seed(config, config.seed)
}

/// Run one simulation with an explicit seed, overriding the configured one.
///
/// Useful for seed sweeps and determinism checks.
pub fn run_with_seed(
    config: &SimulationConfig,
    seed: u64,
) -> SimulationResult<(Vec<Outcome>, RunSummary)> {
    config.validate()?;

    let mut sim = SimWorld::new_with_seed(seed);
    tracing::debug!(seed, "starting simulation run");

    let pool = ResourcePool::new(config.slow_store.concurrency_limit);
    let fast = FastStore::new(config.fast_store.clone());
    let slow = SlowStore::new(sim.downgrade(), config.slow_store.clone(), pool);
    let orchestrator = Rc::new(Orchestrator::new(
        sim.downgrade(),
        Duration::from_secs_f64(config.orchestrator.response_timeout),
        fast,
        slow,
    ));

    let log: OutcomeLog = Rc::new(RefCell::new(Vec::new()));
    let generator = RequestGenerator::new(
        sim.downgrade(),
        orchestrator,
        config.generator.clone(),
        log.clone(),
    );

    drive(&mut sim, generator.run())??;

    let outcomes = log.borrow().clone();
    let mut summary = summarize(&outcomes);
    summary.simulated_time = sim.current_time();
    summary.events_processed = sim.events_processed();

    tracing::debug!(
        requests = summary.request_count,
        successes = summary.success_count,
        errors = summary.error_count,
        simulated_time = ?summary.simulated_time,
        "simulation run finished"
    );

    Ok((outcomes, summary))
}

/// Drive `workload` and the simulation world to completion together.
///
/// The workload is spawned on a current-thread `LocalSet`; the driver then
/// alternates between settling all ready tasks (yielding) and processing one
/// scheduled event (stepping the clock). After the workload finishes, the
/// remaining event queue is drained so abandoned operations run to
/// completion and release whatever they hold.
///
/// Exposed so integration tests can drive component-level futures against a
/// [`SimWorld`] the same way [`run`] drives the generator.
pub fn drive<T, F>(sim: &mut SimWorld, workload: F) -> SimulationResult<T>
where
    T: 'static,
    F: Future<Output = T> + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| SimulationError::InvalidState(format!("failed to build runtime: {e}")))?;
    let local = tokio::task::LocalSet::new();

    runtime.block_on(local.run_until(async {
        let mut handle = tokio::task::spawn_local(workload);

        loop {
            // Let every task that is runnable at this instant make progress
            // before the clock is allowed to move.
            for _ in 0..SETTLE_YIELDS {
                tokio::task::yield_now().await;
            }

            if handle.is_finished() {
                break;
            }

            if sim.has_pending_events() {
                sim.step();
            } else {
                // Nothing runnable, nothing scheduled: the workload cannot
                // make progress anymore.
                return Err(SimulationError::InvalidState(format!(
                    "deadlock: workload suspended with no scheduled events (seed {})",
                    get_current_sim_seed()
                )));
            }
        }

        let result = (&mut handle)
            .await
            .map_err(|_| SimulationError::InvalidState("workload task panicked".to_string()))?;

        // Drain events left behind by races: stale deadlines fire into the
        // void, abandoned operations consume their remaining service time and
        // release their pool slots.
        while sim.has_pending_events() {
            sim.step();
            for _ in 0..SETTLE_YIELDS {
                tokio::task::yield_now().await;
            }
        }

        Ok(result)
    }))
}
