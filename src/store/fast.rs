//! The fast tier: an instantaneous, unreliable key→value store.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use crate::{
    config::FastStoreConfig,
    request::RequestId,
    rng::sim_random_bool,
    store::{StoreError, StoreTier},
};

#[derive(Debug)]
struct FastInner {
    config: FastStoreConfig,
    records: HashMap<RequestId, String>,
}

/// In-memory map with independent Bernoulli failure probabilities for read
/// and write.
///
/// Operations cost zero virtual time but are exposed as `async fn` so the
/// orchestrator spawns and races them exactly like the slow tier's timed
/// operations.
#[derive(Debug, Clone)]
pub struct FastStore {
    inner: Rc<RefCell<FastInner>>,
}

impl FastStore {
    /// Creates an empty store with the given fault model.
    pub fn new(config: FastStoreConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(FastInner {
                config,
                records: HashMap::new(),
            })),
        }
    }

    /// Store `value` under `id`.
    ///
    /// The failure roll happens first: a failed write reports
    /// [`StoreError::ServiceFailure`] without mutating the map.
    pub async fn write(&self, id: RequestId, value: String) -> Result<(), StoreError> {
        let mut inner = self.inner.borrow_mut();
        if sim_random_bool(inner.config.write_failure_probability) {
            tracing::debug!(id, "fast store write failed");
            return Err(StoreError::ServiceFailure(StoreTier::Fast));
        }
        inner.records.insert(id, value);
        tracing::trace!(id, "fast store write ok");
        Ok(())
    }

    /// Fetch the value stored under `id`.
    ///
    /// The failure roll happens first; a healthy roll on an absent id reports
    /// [`StoreError::NotFound`].
    pub async fn read(&self, id: RequestId) -> Result<String, StoreError> {
        let inner = self.inner.borrow();
        if sim_random_bool(inner.config.read_failure_probability) {
            tracing::debug!(id, "fast store read failed");
            return Err(StoreError::ServiceFailure(StoreTier::Fast));
        }
        match inner.records.get(&id) {
            Some(value) => Ok(value.clone()),
            None => Err(StoreError::NotFound(StoreTier::Fast)),
        }
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
}
