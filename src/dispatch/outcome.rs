//! Per-item dispatch outcomes and the batch report.

use std::fmt;

/// Why a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    /// The daemon could not be reached.
    EndpointUnreachable,
    /// The daemon did not answer in time.
    EndpointTimeout,
    /// The daemon requires a secret and none was configured.
    CredentialsRequired,
    /// The configured secret was rejected.
    CredentialsInvalid,
    /// Any other daemon-reported or unexpected failure.
    Unknown,
}

impl DispatchErrorKind {
    /// Fatal kinds stop the batch: every later item would fail the same way.
    #[must_use]
    pub fn is_batch_fatal(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for DispatchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::EndpointUnreachable => "daemon unreachable",
            Self::EndpointTimeout => "daemon timed out",
            Self::CredentialsRequired => "secret required",
            Self::CredentialsInvalid => "secret rejected",
            Self::Unknown => "submission failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Succeeded { job_id: String },
    Failed { kind: DispatchErrorKind, message: String },
}

/// Result of submitting one selected entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// 0-based index of the entry in the enumeration result.
    pub index: usize,
    pub name: String,
    pub status: DispatchStatus,
}

impl DispatchOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.status, DispatchStatus::Succeeded { .. })
    }

    /// The failure kind, if this submission failed.
    #[must_use]
    pub fn failure_kind(&self) -> Option<DispatchErrorKind> {
        match &self.status {
            DispatchStatus::Succeeded { .. } => None,
            DispatchStatus::Failed { kind, .. } => Some(*kind),
        }
    }
}

/// Ordered outcomes of a batch, plus why it stopped early if it did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<DispatchOutcome>,
    /// Total number of items the batch was asked to submit.
    pub requested: usize,
    /// Set when a batch-fatal failure stopped processing.
    pub aborted_by: Option<DispatchErrorKind>,
    /// Set when the cancel flag stopped processing.
    pub cancelled: bool,
}

impl BatchReport {
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Items never attempted because the batch stopped early.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.requested.saturating_sub(self.outcomes.len())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.aborted_by.is_none() && !self.cancelled && self.skipped() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &DispatchOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(index: usize, status: DispatchStatus) -> DispatchOutcome {
        DispatchOutcome {
            index,
            name: format!("f{index}"),
            status,
        }
    }

    #[test]
    fn test_only_unknown_is_non_fatal() {
        assert!(DispatchErrorKind::EndpointUnreachable.is_batch_fatal());
        assert!(DispatchErrorKind::EndpointTimeout.is_batch_fatal());
        assert!(DispatchErrorKind::CredentialsRequired.is_batch_fatal());
        assert!(DispatchErrorKind::CredentialsInvalid.is_batch_fatal());
        assert!(!DispatchErrorKind::Unknown.is_batch_fatal());
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport {
            outcomes: vec![
                outcome(0, DispatchStatus::Succeeded { job_id: "g".into() }),
                outcome(
                    2,
                    DispatchStatus::Failed {
                        kind: DispatchErrorKind::CredentialsInvalid,
                        message: "Unauthorized".into(),
                    },
                ),
            ],
            requested: 3,
            aborted_by: Some(DispatchErrorKind::CredentialsInvalid),
            cancelled: false,
        };
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(!report.is_complete());
        assert_eq!(report.failures().next().map(|o| o.index), Some(2));
    }
}
