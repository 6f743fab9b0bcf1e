//! Assertion macros and result tracking for simulation testing.
//!
//! This module provides `always_assert!` and `sometimes_assert!` macros for
//! checking simulated-system properties. Assertion outcomes are tracked in
//! thread-local storage so statistical properties ("the fallback path is
//! sometimes taken") can be validated across a run without failing it.

use std::cell::RefCell;
use std::collections::HashMap;

/// Statistics for a tracked assertion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssertionStats {
    /// Total number of times this assertion was evaluated.
    pub total_checks: usize,
    /// Number of times the assertion condition was true.
    pub successes: usize,
}

impl AssertionStats {
    /// Calculate the success rate as a percentage (0.0 to 100.0).
    ///
    /// Returns 0.0 if no checks have been performed yet.
    pub fn success_rate(&self) -> f64 {
        if self.total_checks == 0 {
            0.0
        } else {
            (self.successes as f64 / self.total_checks as f64) * 100.0
        }
    }

    /// Record a new assertion check with the given result.
    pub fn record(&mut self, success: bool) {
        self.total_checks += 1;
        if success {
            self.successes += 1;
        }
    }
}

thread_local! {
    /// Thread-local storage for assertion results, isolated per test thread.
    static ASSERTION_RESULTS: RefCell<HashMap<String, AssertionStats>> =
        RefCell::new(HashMap::new());
}

/// Record an assertion result for statistical tracking.
///
/// Used internally by the `sometimes_assert!` macro.
pub fn record_assertion(name: &str, success: bool) {
    ASSERTION_RESULTS.with(|results| {
        let mut results = results.borrow_mut();
        let stats = results.entry(name.to_string()).or_default();
        stats.record(success);
    });
}

/// Get a snapshot of assertion statistics for the current thread.
pub fn get_assertion_results() -> HashMap<String, AssertionStats> {
    ASSERTION_RESULTS.with(|results| results.borrow().clone())
}

/// Reset all assertion statistics to empty state.
///
/// Called by `SimWorld::new_with_seed` so consecutive runs on the same thread
/// start clean.
pub fn reset_assertion_results() {
    ASSERTION_RESULTS.with(|results| {
        results.borrow_mut().clear();
    });
}

/// Validate that every `sometimes_assert!` actually succeeded at least once.
///
/// Returns a vector of violation messages, empty if all assertions are valid.
pub fn validate_assertion_contracts() -> Vec<String> {
    let mut violations = Vec::new();
    let results = get_assertion_results();

    for (name, stats) in &results {
        let rate = stats.success_rate();
        if stats.total_checks > 0 && rate == 0.0 {
            violations.push(format!(
                "sometimes_assert!('{name}') has {rate:.1}% success rate (expected at least 1%)"
            ));
        }
    }

    violations
}

/// Assert that a condition is always true, panicking on failure.
///
/// The panic message includes the current simulation seed so the failing run
/// can be reproduced.
#[macro_export]
macro_rules! always_assert {
    ($name:ident, $condition:expr, $message:expr) => {
        let result = $condition;
        if !result {
            let current_seed = $crate::get_current_sim_seed();
            panic!(
                "Always assertion '{}' failed (seed: {}): {}",
                stringify!($name),
                current_seed,
                $message
            );
        }
    };
}

/// Assert a condition that should sometimes be true, tracking the success
/// rate instead of failing.
#[macro_export]
macro_rules! sometimes_assert {
    ($name:ident, $condition:expr, $message:expr) => {
        let result = $condition;
        $crate::assertions::record_assertion(stringify!($name), result);
    };
}
