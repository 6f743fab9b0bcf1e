//! Pure aggregation over the final outcome log.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::request::{Outcome, OutcomeStatus, RequestKind};

/// Aggregated view of one run, produced after the outcome log is complete.
///
/// Pure data: no scheduling or concurrency involvement. The per-reason error
/// map uses the rendered reason labels (`fast_failure`, `slow_failure`,
/// `timeout`, `not_found`) and a `BTreeMap` for stable ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Total outcomes recorded.
    pub request_count: usize,
    /// Outcomes with status `OK` or a read payload.
    pub success_count: usize,
    /// Outcomes with an `ERROR:*` status.
    pub error_count: usize,
    /// Mean request duration across all outcomes (zero for an empty log).
    pub mean_duration: Duration,
    /// Read requests observed.
    pub read_count: usize,
    /// Write requests observed.
    pub write_count: usize,
    /// Successful reads.
    pub read_successes: usize,
    /// Successful writes.
    pub write_successes: usize,
    /// Error count per terminal reason.
    pub errors_by_reason: BTreeMap<String, usize>,
    /// Final virtual time of the run.
    pub simulated_time: Duration,
    /// Scheduler events processed during the run.
    pub events_processed: u64,
}

/// Fold the outcome log into a [`RunSummary`].
///
/// `simulated_time` and `events_processed` come from the scheduler and are
/// filled in by the runner.
pub fn summarize(outcomes: &[Outcome]) -> RunSummary {
    let mut summary = RunSummary {
        request_count: outcomes.len(),
        success_count: 0,
        error_count: 0,
        mean_duration: Duration::ZERO,
        read_count: 0,
        write_count: 0,
        read_successes: 0,
        write_successes: 0,
        errors_by_reason: BTreeMap::new(),
        simulated_time: Duration::ZERO,
        events_processed: 0,
    };

    let mut total_duration = Duration::ZERO;
    for outcome in outcomes {
        total_duration += outcome.duration;

        match outcome.kind {
            RequestKind::Read => summary.read_count += 1,
            RequestKind::Write => summary.write_count += 1,
        }

        match &outcome.status {
            OutcomeStatus::Error(reason) => {
                summary.error_count += 1;
                *summary
                    .errors_by_reason
                    .entry(reason.to_string())
                    .or_insert(0) += 1;
            }
            _ => {
                summary.success_count += 1;
                match outcome.kind {
                    RequestKind::Read => summary.read_successes += 1,
                    RequestKind::Write => summary.write_successes += 1,
                }
            }
        }
    }

    if !outcomes.is_empty() {
        summary.mean_duration = total_duration / outcomes.len() as u32;
    }

    summary
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run Summary")?;
        writeln!(f, "Requests: {}", self.request_count)?;
        writeln!(
            f,
            "Successes: {} ({} read / {} write)",
            self.success_count, self.read_successes, self.write_successes
        )?;
        writeln!(f, "Errors: {}", self.error_count)?;
        for (reason, count) in &self.errors_by_reason {
            writeln!(f, "  {reason}: {count}")?;
        }
        writeln!(f, "Mean duration: {:?}", self.mean_duration)?;
        writeln!(f, "Simulated time: {:?}", self.simulated_time)?;
        write!(f, "Events processed: {}", self.events_processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ErrorReason;

    fn outcome(kind: RequestKind, status: OutcomeStatus, duration_ms: u64) -> Outcome {
        Outcome {
            kind,
            id: 0,
            status,
            start_time: Duration::ZERO,
            end_time: Duration::from_millis(duration_ms),
            duration: Duration::from_millis(duration_ms),
        }
    }

    #[test]
    fn empty_log_summarizes_to_zeroes() {
        let summary = summarize(&[]);
        assert_eq!(summary.request_count, 0);
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.error_count, 0);
        assert_eq!(summary.mean_duration, Duration::ZERO);
    }

    #[test]
    fn counts_and_mean_duration() {
        let outcomes = vec![
            outcome(RequestKind::Write, OutcomeStatus::Ok, 100),
            outcome(
                RequestKind::Read,
                OutcomeStatus::Data("v".to_string()),
                300,
            ),
            outcome(
                RequestKind::Write,
                OutcomeStatus::Error(ErrorReason::Timeout),
                200,
            ),
            outcome(
                RequestKind::Read,
                OutcomeStatus::Error(ErrorReason::NotFound),
                0,
            ),
        ];

        let summary = summarize(&outcomes);
        assert_eq!(summary.request_count, 4);
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.error_count, 2);
        assert_eq!(summary.read_count, 2);
        assert_eq!(summary.write_count, 2);
        assert_eq!(summary.read_successes, 1);
        assert_eq!(summary.write_successes, 1);
        assert_eq!(summary.mean_duration, Duration::from_millis(150));
        assert_eq!(summary.errors_by_reason["timeout"], 1);
        assert_eq!(summary.errors_by_reason["not_found"], 1);
    }
}
