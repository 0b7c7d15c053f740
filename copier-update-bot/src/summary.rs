//! Run reporting.

use crate::pull_requests::PrStatus;

/// Result of processing a single candidate repository.
#[derive(Debug, Clone)]
pub enum ProcessingResult {
    /// A template update was pushed.
    Updated {
        /// Repository full name.
        repository: String,
        /// Resolved template version.
        version: String,
        /// Pull request status.
        pr: PrStatus,
    },

    /// The regeneration produced no meaningful change.
    Unchanged {
        /// Repository full name.
        repository: String,
    },

    /// The candidate was deliberately skipped.
    Skipped {
        /// Repository full name.
        repository: String,
        /// Reason for skipping.
        reason: String,
    },

    /// The update attempt failed; later candidates still run.
    Failed {
        /// Repository full name.
        repository: String,
        /// Error message.
        error: String,
    },
}

/// Summary of a complete scan.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of candidate repositories discovered.
    pub candidates_discovered: usize,

    /// Number of candidates with a pushed update.
    pub updated: usize,

    /// Number of candidates with no changes after regeneration.
    pub unchanged: usize,

    /// Number of candidates skipped (no push access, existing PR).
    pub skipped: usize,

    /// Number of candidates whose update attempt failed.
    pub failed: usize,

    /// Number of new pull requests opened.
    pub prs_created: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with a processing result.
    pub fn record_result(&mut self, result: &ProcessingResult) {
        match result {
            ProcessingResult::Updated { pr, .. } => {
                self.updated += 1;
                if matches!(pr, PrStatus::Created { .. }) {
                    self.prs_created += 1;
                }
            }
            ProcessingResult::Unchanged { .. } => self.unchanged += 1,
            ProcessingResult::Skipped { .. } => self.skipped += 1,
            ProcessingResult::Failed { .. } => self.failed += 1,
        }
    }

    /// Returns true if any candidate failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_updated_with_new_pr() {
        let mut summary = RunSummary::new(false);

        summary.record_result(&ProcessingResult::Updated {
            repository: "user/project".to_string(),
            version: "3.2.1".to_string(),
            pr: PrStatus::Created {
                number: 7,
                url: "https://github.com/user/project/pull/7".to_string(),
            },
        });

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.prs_created, 1);
        assert!(!summary.has_failures());
    }

    #[test]
    fn records_updated_with_existing_pr() {
        let mut summary = RunSummary::new(false);

        summary.record_result(&ProcessingResult::Updated {
            repository: "user/project".to_string(),
            version: "3.2.1".to_string(),
            pr: PrStatus::Skipped { existing: 5 },
        });

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.prs_created, 0);
    }

    #[test]
    fn records_failures() {
        let mut summary = RunSummary::new(false);

        summary.record_result(&ProcessingResult::Failed {
            repository: "user/project".to_string(),
            error: "clone failed".to_string(),
        });

        assert_eq!(summary.failed, 1);
        assert!(summary.has_failures());
    }
}
