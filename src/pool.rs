//! Bounded-concurrency slot allocation with FIFO fairness.
//!
//! [`ResourcePool`] enforces a fixed capacity of concurrent holders. A free
//! slot is taken immediately; otherwise the acquirer suspends on a ticketed
//! FIFO queue. Releasing a slot hands it to the oldest waiter atomically:
//! the holder count never changes during a transfer, so the pool can never
//! exceed its capacity and no slot is ever granted to two holders.
//!
//! Slots are released through the RAII [`PoolPermit`] guard, which covers
//! every exit path of a holder: normal completion, an injected failure, and
//! abandonment by a caller whose deadline elapsed while the operation was
//! still running.

use std::{
    cell::RefCell,
    collections::{HashSet, VecDeque},
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use crate::always_assert;

#[derive(Debug)]
struct Waiter {
    ticket: u64,
    waker: Option<Waker>,
}

#[derive(Debug)]
struct PoolInner {
    capacity: usize,
    in_use: usize,
    next_ticket: u64,
    waiters: VecDeque<Waiter>,
    granted: HashSet<u64>,
}

impl PoolInner {
    /// Free one slot: transfer it to the oldest waiter if any, otherwise
    /// decrement the holder count. `in_use` is deliberately untouched on
    /// transfer; the slot changes hands without ever being observable as
    /// free.
    fn release_one(&mut self) {
        if let Some(mut waiter) = self.waiters.pop_front() {
            self.granted.insert(waiter.ticket);
            if let Some(waker) = waiter.waker.take() {
                waker.wake();
            }
            tracing::trace!(ticket = waiter.ticket, "slot transferred to oldest waiter");
        } else {
            self.in_use -= 1;
        }
    }
}

/// A capacity-limited allocator granting at most `capacity` simultaneous
/// holders, FIFO-fair under contention.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    inner: Rc<RefCell<PoolInner>>,
}

impl ResourcePool {
    /// Creates a pool with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects that
    /// before a pool is ever built.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "pool capacity must be at least 1");
        Self {
            inner: Rc::new(RefCell::new(PoolInner {
                capacity,
                in_use: 0,
                next_ticket: 0,
                waiters: VecDeque::new(),
                granted: HashSet::new(),
            })),
        }
    }

    /// Acquire a slot, suspending FIFO behind earlier acquirers when the pool
    /// is full. Resolves to a [`PoolPermit`] that releases on drop.
    pub fn acquire(&self) -> Acquire {
        Acquire {
            pool: self.clone(),
            ticket: None,
            acquired: false,
        }
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.borrow().capacity
    }

    /// Number of slots currently held (including slots already transferred
    /// to waiters that have not resumed yet).
    pub fn in_use(&self) -> usize {
        self.inner.borrow().in_use
    }

    /// Number of acquirers currently suspended in the wait queue.
    pub fn waiting(&self) -> usize {
        self.inner.borrow().waiters.len()
    }

    fn release(&self) {
        self.inner.borrow_mut().release_one();
    }
}

/// A held pool slot. Dropping the permit releases the slot, waking the
/// oldest waiter if one exists.
#[derive(Debug)]
pub struct PoolPermit {
    pool: ResourcePool,
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        self.pool.release();
    }
}

/// Future returned by [`ResourcePool::acquire`].
#[derive(Debug)]
pub struct Acquire {
    pool: ResourcePool,
    ticket: Option<u64>,
    acquired: bool,
}

impl Future for Acquire {
    type Output = PoolPermit;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let pool = this.pool.clone();
        let mut inner = this.pool.inner.borrow_mut();

        match this.ticket {
            None => {
                // Fresh acquirer: only jump in when nobody is queued ahead.
                if inner.waiters.is_empty() && inner.in_use < inner.capacity {
                    inner.in_use += 1;
                    always_assert!(
                        pool_capacity_respected,
                        inner.in_use <= inner.capacity,
                        "pool granted more concurrent holders than its capacity"
                    );
                    this.acquired = true;
                    drop(inner);
                    Poll::Ready(PoolPermit { pool })
                } else {
                    let ticket = inner.next_ticket;
                    inner.next_ticket += 1;
                    inner.waiters.push_back(Waiter {
                        ticket,
                        waker: Some(cx.waker().clone()),
                    });
                    this.ticket = Some(ticket);
                    tracing::trace!(
                        ticket,
                        in_use = inner.in_use,
                        waiting = inner.waiters.len(),
                        "pool full, acquirer queued"
                    );
                    Poll::Pending
                }
            }
            Some(ticket) => {
                if inner.granted.remove(&ticket) {
                    this.acquired = true;
                    this.ticket = None;
                    drop(inner);
                    Poll::Ready(PoolPermit { pool })
                } else {
                    // Keep the registered waker current across re-polls.
                    if let Some(waiter) = inner.waiters.iter_mut().find(|w| w.ticket == ticket) {
                        waiter.waker = Some(cx.waker().clone());
                    }
                    Poll::Pending
                }
            }
        }
    }
}

impl Drop for Acquire {
    fn drop(&mut self) {
        if self.acquired {
            return;
        }
        let Some(ticket) = self.ticket else {
            return;
        };
        let mut inner = self.pool.inner.borrow_mut();
        if inner.granted.remove(&ticket) {
            // The slot was handed over but never claimed; pass it on rather
            // than leak it.
            inner.release_one();
        } else {
            inner.waiters.retain(|w| w.ticket != ticket);
        }
    }
}
