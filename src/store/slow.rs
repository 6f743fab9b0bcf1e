//! The slow tier: a delayed, unreliable, concurrency-bounded key→value store.

use std::{cell::RefCell, collections::HashMap, rc::Rc, time::Duration};

use crate::{
    config::SlowStoreConfig,
    pool::ResourcePool,
    request::RequestId,
    rng::{sim_random_bool, sim_random_range_or_default},
    sim::WeakSimWorld,
    store::{StoreError, StoreTier},
};

#[derive(Debug)]
struct SlowInner {
    config: SlowStoreConfig,
    records: HashMap<RequestId, String>,
}

/// Key→value store with the same fault model as the fast tier, plus a pool
/// gate and a uniform service delay per operation.
///
/// Every operation: acquires a pool slot, sleeps a service time drawn from
/// `[0, max_time]`, then rolls its failure probability and touches the map.
/// The slot is an RAII permit held across all of that, so it is released on
/// every exit path, including abandonment by a caller whose response
/// deadline elapsed. An abandoned operation still runs to completion inside
/// the scheduler; only its result goes unread.
#[derive(Debug, Clone)]
pub struct SlowStore {
    sim: WeakSimWorld,
    pool: ResourcePool,
    inner: Rc<RefCell<SlowInner>>,
}

impl SlowStore {
    /// Creates an empty store gated by `pool`.
    pub fn new(sim: WeakSimWorld, config: SlowStoreConfig, pool: ResourcePool) -> Self {
        Self {
            sim,
            pool,
            inner: Rc::new(RefCell::new(SlowInner {
                config,
                records: HashMap::new(),
            })),
        }
    }

    /// Store `value` under `id` after the pool gate and service delay.
    pub async fn write(&self, id: RequestId, value: String) -> Result<(), StoreError> {
        let _permit = self.pool.acquire().await;

        let max_write_time = self.inner.borrow().config.max_write_time;
        self.service_delay(max_write_time).await?;

        let mut inner = self.inner.borrow_mut();
        if sim_random_bool(inner.config.write_failure_probability) {
            tracing::debug!(id, "slow store write failed");
            return Err(StoreError::ServiceFailure(StoreTier::Slow));
        }
        inner.records.insert(id, value);
        tracing::trace!(id, "slow store write ok");
        Ok(())
    }

    /// Fetch the value stored under `id` after the pool gate and service
    /// delay.
    pub async fn read(&self, id: RequestId) -> Result<String, StoreError> {
        let _permit = self.pool.acquire().await;

        let max_read_time = self.inner.borrow().config.max_read_time;
        self.service_delay(max_read_time).await?;

        let inner = self.inner.borrow();
        if sim_random_bool(inner.config.read_failure_probability) {
            tracing::debug!(id, "slow store read failed");
            return Err(StoreError::ServiceFailure(StoreTier::Slow));
        }
        match inner.records.get(&id) {
            Some(value) => Ok(value.clone()),
            None => Err(StoreError::NotFound(StoreTier::Slow)),
        }
    }

    /// Sleep a service time drawn uniformly from `[0, max_secs]`.
    async fn service_delay(&self, max_secs: f64) -> Result<(), StoreError> {
        let delay_secs = sim_random_range_or_default(0.0..max_secs);
        self.sim
            .sleep(Duration::from_secs_f64(delay_secs))?
            .await?;
        Ok(())
    }

    /// Whether a record exists for `id`.
    pub fn contains(&self, id: RequestId) -> bool {
        self.inner.borrow().records.contains_key(&id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.borrow().records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().records.is_empty()
    }

    /// The pool gating this store, for observing contention in tests.
    pub fn pool(&self) -> &ResourcePool {
        &self.pool
    }
}
