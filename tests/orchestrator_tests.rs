//! Orchestrator routing tests: the success/failure/timeout matrix for both
//! request kinds, driven against a real world, pool and stores.

use std::rc::Rc;
use std::time::Duration;

use pipesim::{
    drive, ErrorReason, FastStore, FastStoreConfig, Orchestrator, OutcomeStatus, Request,
    RequestKind, ResourcePool, SimWorld, SimulationResult, SlowStore, SlowStoreConfig,
};

struct Fixture {
    sim: SimWorld,
    fast: FastStore,
    slow: SlowStore,
    orchestrator: Rc<Orchestrator>,
}

fn fixture(
    seed: u64,
    fast_config: FastStoreConfig,
    slow_config: SlowStoreConfig,
    response_timeout: f64,
) -> Fixture {
    let sim = SimWorld::new_with_seed(seed);
    let pool = ResourcePool::new(slow_config.concurrency_limit);
    let fast = FastStore::new(fast_config);
    let slow = SlowStore::new(sim.downgrade(), slow_config, pool);
    let orchestrator = Rc::new(Orchestrator::new(
        sim.downgrade(),
        Duration::from_secs_f64(response_timeout),
        fast.clone(),
        slow.clone(),
    ));
    Fixture {
        sim,
        fast,
        slow,
        orchestrator,
    }
}

fn write_request(id: u64) -> Request {
    Request {
        id,
        kind: RequestKind::Write,
        payload: Some(format!("payload-{id}")),
        arrival_time: Duration::ZERO,
    }
}

fn read_request(id: u64) -> Request {
    Request {
        id,
        kind: RequestKind::Read,
        payload: None,
        arrival_time: Duration::ZERO,
    }
}

fn process(fixture: &mut Fixture, request: Request) -> SimulationResult<OutcomeStatus> {
    let orchestrator = fixture.orchestrator.clone();
    drive(&mut fixture.sim, async move {
        orchestrator.process(&request).await
    })?
}

#[test]
fn write_success_reaches_both_tiers() {
    let mut fixture = fixture(
        1,
        FastStoreConfig::default(),
        SlowStoreConfig::default(),
        1.0,
    );

    let status = process(&mut fixture, write_request(1)).expect("process");
    assert_eq!(status, OutcomeStatus::Ok);
    assert!(fixture.fast.contains(1));
    assert!(fixture.slow.contains(1));
}

#[test]
fn read_is_served_by_the_fast_tier() {
    let mut fixture = fixture(
        2,
        FastStoreConfig::default(),
        SlowStoreConfig::default(),
        1.0,
    );

    let status = process(&mut fixture, write_request(10)).expect("seed write");
    assert_eq!(status, OutcomeStatus::Ok);

    let status = process(&mut fixture, read_request(10)).expect("read");
    assert_eq!(status, OutcomeStatus::Data("payload-10".to_string()));
}

#[test]
fn read_falls_back_to_the_slow_tier() {
    let mut fixture = fixture(
        3,
        FastStoreConfig::default(),
        SlowStoreConfig::default(),
        1.0,
    );

    // Seed the slow tier only; the fast tier misses and the orchestrator
    // falls back.
    let slow = fixture.slow.clone();
    drive(&mut fixture.sim, async move {
        slow.write(20, "slow-only".to_string()).await
    })
    .expect("drive")
    .expect("slow write");
    assert!(!fixture.fast.contains(20));

    let status = process(&mut fixture, read_request(20)).expect("read");
    assert_eq!(status, OutcomeStatus::Data("slow-only".to_string()));
}

#[test]
fn write_stops_at_a_fast_tier_failure() {
    let mut fixture = fixture(
        4,
        FastStoreConfig {
            write_failure_probability: 1.0,
            ..FastStoreConfig::default()
        },
        SlowStoreConfig::default(),
        1.0,
    );

    let status = process(&mut fixture, write_request(30)).expect("process");
    assert_eq!(status, OutcomeStatus::Error(ErrorReason::FastFailure));
    // The slow tier is never attempted after a fast-tier write failure.
    assert!(fixture.slow.is_empty());
    assert!(fixture.fast.is_empty());
}

#[test]
fn slow_write_failure_leaves_the_fast_copy() {
    let mut fixture = fixture(
        5,
        FastStoreConfig::default(),
        SlowStoreConfig {
            write_failure_probability: 1.0,
            ..SlowStoreConfig::default()
        },
        1.0,
    );

    let status = process(&mut fixture, write_request(40)).expect("process");
    assert_eq!(status, OutcomeStatus::Error(ErrorReason::SlowFailure));
    // The documented inconsistency: the fast tier keeps the value even though
    // the request failed.
    assert!(fixture.fast.contains(40));
    assert!(fixture.slow.is_empty());
}

#[test]
fn read_of_unknown_id_reports_not_found() {
    let mut fixture = fixture(
        6,
        FastStoreConfig::default(),
        SlowStoreConfig::default(),
        1.0,
    );

    let status = process(&mut fixture, read_request(999)).expect("process");
    assert_eq!(status, OutcomeStatus::Error(ErrorReason::NotFound));
}

#[test]
fn read_service_failures_propagate_the_slow_reason() {
    let mut fixture = fixture(
        7,
        FastStoreConfig {
            read_failure_probability: 1.0,
            ..FastStoreConfig::default()
        },
        SlowStoreConfig {
            read_failure_probability: 1.0,
            ..SlowStoreConfig::default()
        },
        1.0,
    );

    let status = process(&mut fixture, read_request(50)).expect("process");
    assert_eq!(status, OutcomeStatus::Error(ErrorReason::SlowFailure));
}

#[test]
fn slow_write_timeout_is_fatal_to_the_request_only() {
    // A service-time cap three orders of magnitude above the deadline makes
    // the draw all but certain to exceed it.
    let mut fixture = fixture(
        8,
        FastStoreConfig::default(),
        SlowStoreConfig {
            max_write_time: 1000.0,
            ..SlowStoreConfig::default()
        },
        0.5,
    );

    let status = process(&mut fixture, write_request(60)).expect("process");
    assert_eq!(status, OutcomeStatus::Error(ErrorReason::Timeout));
    // The fast tier accepted the write before the slow tier timed out.
    assert!(fixture.fast.contains(60));
    // The abandoned operation ran to completion during the drain: the slow
    // map gained the value even though the caller saw a timeout, and the pool
    // slot came back.
    assert!(fixture.slow.contains(60));
    assert_eq!(fixture.slow.pool().in_use(), 0);
}

#[test]
fn timed_out_read_falls_back_and_can_still_time_out() {
    let mut fixture = fixture(
        9,
        FastStoreConfig {
            read_failure_probability: 1.0,
            ..FastStoreConfig::default()
        },
        SlowStoreConfig {
            max_read_time: 1000.0,
            ..SlowStoreConfig::default()
        },
        0.5,
    );

    // Seed the slow tier so the fallback has something to chew on.
    let slow = fixture.slow.clone();
    drive(&mut fixture.sim, async move {
        slow.write(70, "buried".to_string()).await
    })
    .expect("drive")
    .expect("slow write");

    let status = process(&mut fixture, read_request(70)).expect("process");
    assert_eq!(status, OutcomeStatus::Error(ErrorReason::Timeout));
}
