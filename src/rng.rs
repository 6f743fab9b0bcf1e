//! Thread-local random number generation for simulation.
//!
//! This module provides deterministic randomness through thread-local storage,
//! enabling clean API design without passing RNG handles through every
//! component. Each thread maintains its own RNG state, ensuring deterministic
//! behavior within each simulation run while supporting parallel test
//! execution.

use rand::SeedableRng;
use rand::{
    distributions::{Distribution, Standard, uniform::SampleUniform},
    Rng,
};
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;

thread_local! {
    /// Thread-local random number generator for simulation.
    ///
    /// Uses ChaCha8Rng for deterministic, reproducible randomness.
    static SIM_RNG: RefCell<ChaCha8Rng> = RefCell::new(ChaCha8Rng::from_entropy());

    /// The seed last set via [`set_sim_seed`], kept for error reporting.
    static CURRENT_SEED: RefCell<u64> = const { RefCell::new(0) };
}

/// Generate a random value using the thread-local simulation RNG.
///
/// The same seed always produces the same sequence of values within a single
/// thread.
pub fn sim_random<T>() -> T
where
    Standard: Distribution<T>,
{
    SIM_RNG.with(|rng| rng.borrow_mut().sample(Standard))
}

/// Generate a random value within a range (exclusive upper bound) using the
/// thread-local simulation RNG.
pub fn sim_random_range<T>(range: std::ops::Range<T>) -> T
where
    T: SampleUniform + PartialOrd,
{
    SIM_RNG.with(|rng| rng.borrow_mut().gen_range(range))
}

/// Generate a random value within the given range, returning the start value
/// if the range is empty.
///
/// This is the safe version of [`sim_random_range`] for ranges that can
/// legitimately collapse, e.g. a service-time draw from `0.0..0.0` when the
/// configured maximum is zero.
pub fn sim_random_range_or_default<T>(range: std::ops::Range<T>) -> T
where
    T: SampleUniform + PartialOrd + Clone,
{
    if range.start >= range.end {
        range.start
    } else {
        sim_random_range(range)
    }
}

/// Draw a Bernoulli trial with the given probability of `true`.
///
/// `probability` is clamped by comparison: values ≤ 0.0 never fire, values
/// ≥ 1.0 always fire (the underlying uniform draw lives in `[0, 1)`).
pub fn sim_random_bool(probability: f64) -> bool {
    sim_random::<f64>() < probability
}

/// Set the seed for the thread-local simulation RNG.
///
/// The same seed always reproduces the same sequence of random values.
pub fn set_sim_seed(seed: u64) {
    SIM_RNG.with(|rng| {
        *rng.borrow_mut() = ChaCha8Rng::seed_from_u64(seed);
    });
    CURRENT_SEED.with(|current| {
        *current.borrow_mut() = seed;
    });
}

/// Get the seed that was last set via [`set_sim_seed`].
///
/// Useful for error reporting so failing runs can be reproduced.
pub fn get_current_sim_seed() -> u64 {
    CURRENT_SEED.with(|current| *current.borrow())
}

/// Reset the thread-local simulation RNG to a fresh entropy-based state.
///
/// Call before setting a new seed to guarantee clean state between
/// consecutive simulation runs on the same thread.
pub fn reset_sim_rng() {
    SIM_RNG.with(|rng| {
        *rng.borrow_mut() = ChaCha8Rng::from_entropy();
    });
    CURRENT_SEED.with(|current| {
        *current.borrow_mut() = 0;
    });
}
