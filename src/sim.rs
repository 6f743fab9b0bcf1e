use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::{Rc, Weak},
    task::Waker,
    time::Duration,
};
use tracing::instrument;

use crate::{
    assertions::reset_assertion_results,
    error::{SimulationError, SimulationResult},
    events::{Event, EventQueue, ScheduledEvent},
    rng::{reset_sim_rng, set_sim_seed},
    sleep::SleepFuture,
};

#[derive(Debug)]
struct SimInner {
    current_time: Duration,
    event_queue: EventQueue,
    next_sequence: u64,

    // Task management for sleep functionality
    next_task_id: u64,
    awakened_tasks: HashSet<u64>,
    task_wakers: HashMap<u64, Waker>,

    // Event processing metrics
    events_processed: u64,
}

impl SimInner {
    fn new() -> Self {
        Self {
            current_time: Duration::ZERO,
            event_queue: EventQueue::new(),
            next_sequence: 0,
            next_task_id: 0,
            awakened_tasks: HashSet::new(),
            task_wakers: HashMap::new(),
            events_processed: 0,
        }
    }
}

/// The central simulation coordinator that manages virtual time and event
/// processing.
///
/// `SimWorld` owns all mutable scheduler state and provides the main
/// interface for scheduling timers and advancing simulation time. It uses a
/// centralized ownership model with handle-based access
/// ([`WeakSimWorld`]) to avoid borrow checker conflicts between the
/// components that share it.
#[derive(Debug)]
pub struct SimWorld {
    inner: Rc<RefCell<SimInner>>,
}

impl SimWorld {
    /// Creates a new simulation world with the default seed (0).
    ///
    /// For custom seeds, use [`SimWorld::new_with_seed`].
    pub fn new() -> Self {
        Self::new_with_seed(0)
    }

    /// Creates a new simulation world with a specific seed for deterministic
    /// randomness.
    ///
    /// Resets the thread-local RNG and assertion registry before seeding, so
    /// consecutive simulations on the same thread start from clean state.
    pub fn new_with_seed(seed: u64) -> Self {
        reset_sim_rng();
        set_sim_seed(seed);
        reset_assertion_results();

        Self {
            inner: Rc::new(RefCell::new(SimInner::new())),
        }
    }

    /// Processes the next scheduled event and advances time.
    ///
    /// Returns `true` if more events are available for processing,
    /// `false` if this was the last event or if no events are available.
    #[instrument(skip(self))]
    pub fn step(&mut self) -> bool {
        let mut inner = self.inner.borrow_mut();

        if let Some(scheduled_event) = inner.event_queue.pop_earliest() {
            // Advance logical time to the event timestamp
            inner.current_time = scheduled_event.time();

            Self::process_event_with_inner(&mut inner, scheduled_event.into_event());

            !inner.event_queue.is_empty()
        } else {
            false
        }
    }

    /// Processes all scheduled events until the queue is empty.
    ///
    /// Note that tasks suspended on those events only make progress when the
    /// surrounding executor polls them; the cooperative driver in
    /// [`crate::runner`] interleaves stepping with yielding for that reason.
    #[instrument(skip(self))]
    pub fn run_until_empty(&mut self) {
        while self.step() {
            // Continue processing events
        }
    }

    /// Returns the current simulation time.
    pub fn current_time(&self) -> Duration {
        self.inner.borrow().current_time
    }

    /// Schedules an event to execute after the specified delay from the
    /// current time.
    ///
    /// Delays are non-negative, so every scheduled time is ≥ the current
    /// time; causality cannot be violated from this API.
    #[instrument(skip(self))]
    pub fn schedule_event(&self, event: Event, delay: Duration) {
        let mut inner = self.inner.borrow_mut();
        let scheduled_time = inner.current_time + delay;
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;

        let scheduled_event = ScheduledEvent::new(scheduled_time, event, sequence);
        inner.event_queue.schedule(scheduled_event);
    }

    /// Creates a weak reference to this simulation world.
    ///
    /// Weak handles are what the stores, pool, orchestrator and generator
    /// hold; they can access the simulation without keeping it alive past the
    /// run.
    pub fn downgrade(&self) -> WeakSimWorld {
        WeakSimWorld {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Returns `true` if there are events waiting to be processed.
    pub fn has_pending_events(&self) -> bool {
        !self.inner.borrow().event_queue.is_empty()
    }

    /// Returns the number of events waiting to be processed.
    pub fn pending_event_count(&self) -> usize {
        self.inner.borrow().event_queue.len()
    }

    /// Returns the number of events processed so far.
    pub fn events_processed(&self) -> u64 {
        self.inner.borrow().events_processed
    }

    /// Sleep for the specified duration in simulation time.
    ///
    /// Schedules a timer event and returns a future that completes once the
    /// event is processed. This is the sole suspension primitive; interarrival
    /// gaps, service delays and response deadlines are all built on it.
    #[instrument(skip(self))]
    pub fn sleep(&self, duration: Duration) -> SleepFuture {
        let task_id = self.generate_task_id();

        self.schedule_event(Event::Timer { task_id }, duration);

        SleepFuture::new(self.downgrade(), task_id)
    }

    /// Generate a unique task ID for sleep operations.
    fn generate_task_id(&self) -> u64 {
        let mut inner = self.inner.borrow_mut();
        let task_id = inner.next_task_id;
        inner.next_task_id += 1;
        task_id
    }

    /// Check if a task's wake event has been processed.
    ///
    /// Used internally by [`SleepFuture`].
    pub(crate) fn is_task_awake(&self, task_id: u64) -> bool {
        self.inner.borrow().awakened_tasks.contains(&task_id)
    }

    /// Register a waker to be called when the task's wake event is processed.
    ///
    /// Used internally by [`SleepFuture`].
    pub(crate) fn register_task_waker(&self, task_id: u64, waker: Waker) {
        let mut inner = self.inner.borrow_mut();
        inner.task_wakers.insert(task_id, waker);
    }

    fn process_event_with_inner(inner: &mut SimInner, event: Event) {
        inner.events_processed += 1;

        match event {
            Event::Timer { task_id } => {
                tracing::trace!(task_id, time = ?inner.current_time, "timer fired");

                inner.awakened_tasks.insert(task_id);

                // Wake the future that was sleeping. A timer whose sleeper was
                // dropped (e.g. the deadline of a race the operation won) has
                // no waker registered and fires into the void.
                if let Some(waker) = inner.task_wakers.remove(&task_id) {
                    waker.wake();
                }
            }
        }
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// A weak reference to a [`SimWorld`].
///
/// Operations return [`SimulationError::SimulationShutdown`] if the
/// simulation has been dropped.
#[derive(Debug, Clone)]
pub struct WeakSimWorld {
    inner: Weak<RefCell<SimInner>>,
}

impl WeakSimWorld {
    /// Upgrades to a full [`SimWorld`] handle.
    pub fn upgrade(&self) -> SimulationResult<SimWorld> {
        self.inner
            .upgrade()
            .map(|inner| SimWorld { inner })
            .ok_or(SimulationError::SimulationShutdown)
    }

    /// Returns the current simulation time.
    pub fn now(&self) -> SimulationResult<Duration> {
        Ok(self.upgrade()?.current_time())
    }

    /// Sleep for the specified duration in simulation time.
    pub fn sleep(&self, duration: Duration) -> SimulationResult<SleepFuture> {
        Ok(self.upgrade()?.sleep(duration))
    }
}
