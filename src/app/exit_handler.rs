//! Exit code logic for the sharefetch process.
//!
//! Maps a finished batch to the process exit outcome.

use sharefetch_core::BatchReport;

use crate::ProcessExit;

/// Determines the process exit outcome from succeeded and failed counts.
pub(crate) fn determine_exit_outcome(succeeded: usize, failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else if succeeded > 0 {
        ProcessExit::Partial
    } else {
        ProcessExit::Failure
    }
}

/// Exit outcome for a dispatch batch. Items skipped after a fatal stop or a
/// cancel count as failures.
pub(crate) fn batch_exit_outcome(report: &BatchReport) -> ProcessExit {
    determine_exit_outcome(report.succeeded(), report.failed() + report.skipped())
}

#[cfg(test)]
mod tests {
    use super::{batch_exit_outcome, determine_exit_outcome};
    use crate::ProcessExit;
    use sharefetch_core::{BatchReport, DispatchErrorKind, DispatchOutcome, DispatchStatus};

    fn outcome(index: usize, ok: bool) -> DispatchOutcome {
        DispatchOutcome {
            index,
            name: format!("f{index}"),
            status: if ok {
                DispatchStatus::Succeeded {
                    job_id: "gid".to_string(),
                }
            } else {
                DispatchStatus::Failed {
                    kind: DispatchErrorKind::Unknown,
                    message: "boom".to_string(),
                }
            },
        }
    }

    #[test]
    fn test_exit_outcome_success_when_no_failures() {
        assert_eq!(determine_exit_outcome(3, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_success_when_nothing_selected() {
        assert_eq!(determine_exit_outcome(0, 0), ProcessExit::Success);
    }

    #[test]
    fn test_exit_outcome_partial_when_mixed() {
        assert_eq!(determine_exit_outcome(2, 1), ProcessExit::Partial);
    }

    #[test]
    fn test_exit_outcome_failure_when_all_failed() {
        assert_eq!(determine_exit_outcome(0, 2), ProcessExit::Failure);
    }

    #[test]
    fn test_batch_exit_counts_skipped_as_failed() {
        let report = BatchReport {
            outcomes: vec![outcome(0, true)],
            requested: 3,
            aborted_by: Some(DispatchErrorKind::CredentialsInvalid),
            cancelled: false,
        };
        assert_eq!(batch_exit_outcome(&report), ProcessExit::Partial);
    }

    #[test]
    fn test_batch_exit_success_when_all_submitted() {
        let report = BatchReport {
            outcomes: vec![outcome(0, true), outcome(1, true)],
            requested: 2,
            aborted_by: None,
            cancelled: false,
        };
        assert_eq!(batch_exit_outcome(&report), ProcessExit::Success);
    }
}
