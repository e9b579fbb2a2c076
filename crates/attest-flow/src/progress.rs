// Protocol progress tracking
//
// QUERYING -> VERIFYING -> BUILDING -> FILTERING -> AWAITING_ORACLE_SIGNATURE
//   -> COLLECTING_SIGNATURES -> FINALIZING -> DONE
//
// FAILED(kind) is reachable from every non-terminal step. Nothing moves
// backwards; a restart uses a fresh tracker.

use std::fmt;

use attest_error::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// A step of one protocol run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolStep {
    Querying,
    Verifying,
    Building,
    Filtering,
    AwaitingOracleSignature,
    CollectingSignatures,
    Finalizing,
    Done,
    Failed(ErrorKind),
}

impl ProtocolStep {
    /// Human-readable label reported while the step runs
    pub fn label(&self) -> &'static str {
        match self {
            ProtocolStep::Querying => "Oracle answer",
            ProtocolStep::Verifying => "Verifying the proof",
            ProtocolStep::Building => "Transaction building",
            ProtocolStep::Filtering => "Filtering for the oracle",
            ProtocolStep::AwaitingOracleSignature => "Awaiting oracle signature",
            ProtocolStep::CollectingSignatures => "Signatures",
            ProtocolStep::Finalizing => "Finalizing",
            ProtocolStep::Done => "Done",
            ProtocolStep::Failed(_) => "Failed",
        }
    }

    /// The step that must follow this one on success
    pub fn next(&self) -> Option<ProtocolStep> {
        match self {
            ProtocolStep::Querying => Some(ProtocolStep::Verifying),
            ProtocolStep::Verifying => Some(ProtocolStep::Building),
            ProtocolStep::Building => Some(ProtocolStep::Filtering),
            ProtocolStep::Filtering => Some(ProtocolStep::AwaitingOracleSignature),
            ProtocolStep::AwaitingOracleSignature => Some(ProtocolStep::CollectingSignatures),
            ProtocolStep::CollectingSignatures => Some(ProtocolStep::Finalizing),
            ProtocolStep::Finalizing => Some(ProtocolStep::Done),
            ProtocolStep::Done | ProtocolStep::Failed(_) => None,
        }
    }

    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProtocolStep::Done | ProtocolStep::Failed(_))
    }
}

impl fmt::Display for ProtocolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolStep::Querying => write!(f, "QUERYING"),
            ProtocolStep::Verifying => write!(f, "VERIFYING"),
            ProtocolStep::Building => write!(f, "BUILDING"),
            ProtocolStep::Filtering => write!(f, "FILTERING"),
            ProtocolStep::AwaitingOracleSignature => write!(f, "AWAITING_ORACLE_SIGNATURE"),
            ProtocolStep::CollectingSignatures => write!(f, "COLLECTING_SIGNATURES"),
            ProtocolStep::Finalizing => write!(f, "FINALIZING"),
            ProtocolStep::Done => write!(f, "DONE"),
            ProtocolStep::Failed(kind) => write!(f, "FAILED({})", kind),
        }
    }
}

/// Rejected transition
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("Cannot move from {from} to {to}")]
    OutOfOrder { from: String, to: String },
}

/// Tracks the steps of a single run
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    history: Vec<ProtocolStep>,
}

impl ProgressTracker {
    /// Create a tracker for a run that has not started
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step, `None` before the run starts
    pub fn current(&self) -> Option<ProtocolStep> {
        self.history.last().copied()
    }

    /// Every step entered so far, in order
    pub fn history(&self) -> &[ProtocolStep] {
        &self.history
    }

    /// Whether the run completed
    pub fn is_done(&self) -> bool {
        self.current() == Some(ProtocolStep::Done)
    }

    /// Enter `step`, which must directly follow the current one
    pub fn advance(&mut self, step: ProtocolStep) -> Result<(), ProgressError> {
        let expected = match self.current() {
            None => Some(ProtocolStep::Querying),
            Some(current) => current.next(),
        };
        if expected != Some(step) {
            return Err(self.out_of_order(step));
        }

        info!(step = %step, label = step.label(), "Progress");
        self.history.push(step);
        Ok(())
    }

    /// End the run with `kind`; only valid from a started, non-terminal step
    pub fn fail(&mut self, kind: ErrorKind) -> Result<(), ProgressError> {
        let failed = ProtocolStep::Failed(kind);
        match self.current() {
            Some(current) if !current.is_terminal() => {
                info!(step = %failed, after = %current, "Progress");
                self.history.push(failed);
                Ok(())
            }
            _ => Err(self.out_of_order(failed)),
        }
    }

    fn out_of_order(&self, to: ProtocolStep) -> ProgressError {
        ProgressError::OutOfOrder {
            from: self
                .current()
                .map(|step| step.to_string())
                .unwrap_or_else(|| "START".to_string()),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY_PATH: [ProtocolStep; 8] = [
        ProtocolStep::Querying,
        ProtocolStep::Verifying,
        ProtocolStep::Building,
        ProtocolStep::Filtering,
        ProtocolStep::AwaitingOracleSignature,
        ProtocolStep::CollectingSignatures,
        ProtocolStep::Finalizing,
        ProtocolStep::Done,
    ];

    #[test]
    fn test_happy_path() {
        let mut tracker = ProgressTracker::new();
        for step in HAPPY_PATH {
            tracker.advance(step).unwrap();
        }
        assert!(tracker.is_done());
        assert_eq!(tracker.history(), &HAPPY_PATH);
    }

    #[test]
    fn test_skipping_a_step_rejected() {
        let mut tracker = ProgressTracker::new();
        tracker.advance(ProtocolStep::Querying).unwrap();
        let err = tracker.advance(ProtocolStep::Building).unwrap_err();
        assert_eq!(
            err,
            ProgressError::OutOfOrder {
                from: "QUERYING".to_string(),
                to: "BUILDING".to_string()
            }
        );
        assert_eq!(tracker.current(), Some(ProtocolStep::Querying));
    }

    #[test]
    fn test_cannot_start_midway_or_go_back() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.advance(ProtocolStep::Verifying).is_err());
        tracker.advance(ProtocolStep::Querying).unwrap();
        tracker.advance(ProtocolStep::Verifying).unwrap();
        assert!(tracker.advance(ProtocolStep::Querying).is_err());
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker.fail(ErrorKind::OracleTimeout).is_err());

        tracker.advance(ProtocolStep::Querying).unwrap();
        tracker.fail(ErrorKind::OracleTimeout).unwrap();
        assert_eq!(tracker.current(), Some(ProtocolStep::Failed(ErrorKind::OracleTimeout)));
        assert!(tracker.fail(ErrorKind::ProofInvalid).is_err());
        assert!(tracker.advance(ProtocolStep::Verifying).is_err());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ProtocolStep::AwaitingOracleSignature.to_string(), "AWAITING_ORACLE_SIGNATURE");
        assert_eq!(
            ProtocolStep::Failed(ErrorKind::SignatureRefused).to_string(),
            "FAILED(SignatureRefused)"
        );
    }
}
