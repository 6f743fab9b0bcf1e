//! Request and outcome types for the simulated pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Identifier assigned to each generated request; doubles as the storage key.
pub type RequestId = u64;

/// The two operations the pipeline routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Fetch a previously written value.
    Read,
    /// Store a value under a fresh id.
    Write,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Read => write!(f, "read"),
            RequestKind::Write => write!(f, "write"),
        }
    }
}

/// A single request flowing through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Target id: fresh for writes, a previously written id for reads.
    pub id: RequestId,
    /// Read or write.
    pub kind: RequestKind,
    /// Payload to store; present only for writes.
    pub payload: Option<String>,
    /// Virtual time at which the generator issued the request.
    pub arrival_time: Duration,
}

/// Reason attached to a terminal error outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorReason {
    /// The fast tier failed a write; the slow tier was never attempted.
    FastFailure,
    /// The slow tier failed the final attempt.
    SlowFailure,
    /// A response deadline elapsed before the raced attempt settled.
    Timeout,
    /// Neither tier holds a record for the requested id.
    NotFound,
}

impl ErrorReason {
    /// The wire label used in rendered outcome statuses.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorReason::FastFailure => "fast_failure",
            ErrorReason::SlowFailure => "slow_failure",
            ErrorReason::Timeout => "timeout",
            ErrorReason::NotFound => "not_found",
        }
    }
}

impl fmt::Display for ErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of a request: exactly one of `OK`, the read payload, or
/// `ERROR:<reason>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// A write was confirmed end to end.
    Ok,
    /// A read returned this value.
    Data(String),
    /// The request failed for the given reason.
    Error(ErrorReason),
}

impl OutcomeStatus {
    /// `true` for `OK` and read data, `false` for errors.
    pub fn is_success(&self) -> bool {
        !matches!(self, OutcomeStatus::Error(_))
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Ok => write!(f, "OK"),
            OutcomeStatus::Data(value) => f.write_str(value),
            OutcomeStatus::Error(reason) => write!(f, "ERROR:{reason}"),
        }
    }
}

/// The recorded result of one request, immutable once appended to the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Read or write.
    pub kind: RequestKind,
    /// The id the request targeted.
    pub id: RequestId,
    /// Terminal status.
    pub status: OutcomeStatus,
    /// Virtual time the request entered the orchestrator.
    pub start_time: Duration,
    /// Virtual time the terminal status was reached.
    pub end_time: Duration,
    /// `end_time - start_time`.
    pub duration: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_rendering_matches_wire_format() {
        assert_eq!(OutcomeStatus::Ok.to_string(), "OK");
        assert_eq!(
            OutcomeStatus::Data("payload-3".to_string()).to_string(),
            "payload-3"
        );
        assert_eq!(
            OutcomeStatus::Error(ErrorReason::FastFailure).to_string(),
            "ERROR:fast_failure"
        );
        assert_eq!(
            OutcomeStatus::Error(ErrorReason::SlowFailure).to_string(),
            "ERROR:slow_failure"
        );
        assert_eq!(
            OutcomeStatus::Error(ErrorReason::Timeout).to_string(),
            "ERROR:timeout"
        );
        assert_eq!(
            OutcomeStatus::Error(ErrorReason::NotFound).to_string(),
            "ERROR:not_found"
        );
    }

    #[test]
    fn success_classification() {
        assert!(OutcomeStatus::Ok.is_success());
        assert!(OutcomeStatus::Data("x".to_string()).is_success());
        assert!(!OutcomeStatus::Error(ErrorReason::Timeout).is_success());
    }
}
