//! Run summaries.

use serde::Serialize;

use crate::results::{OutcomeRecord, PhotoStatus};

/// Tally of one account's run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub account: String,
    /// Groups the platform assigned an id to (with or without photo).
    pub created: usize,
    pub with_photo: usize,
    /// Requests recorded as not created.
    pub failed: usize,
    /// Requests never attempted because the run was cancelled.
    pub skipped: usize,
}

impl AccountSummary {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, record: &OutcomeRecord) {
        match record.photo() {
            Some(PhotoStatus::HavePhoto) => {
                self.created += 1;
                self.with_photo += 1;
            }
            Some(PhotoStatus::NoPhoto) => self.created += 1,
            None => self.failed += 1,
        }
    }

    /// Requests that produced a record.
    pub fn processed(&self) -> usize {
        self.created + self.failed
    }
}

/// Per-account summaries in input order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FleetReport {
    pub accounts: Vec<AccountSummary>,
}

impl FleetReport {
    pub fn total(&self) -> AccountSummary {
        self.accounts
            .iter()
            .fold(AccountSummary::new("fleet"), |mut acc, s| {
                acc.created += s.created;
                acc.with_photo += s.with_photo;
                acc.failed += s.failed;
                acc.skipped += s.skipped;
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::GroupRequest;

    #[test]
    fn test_summary_counts_outcomes() {
        let request = GroupRequest::new("Cats", "pets");
        let mut summary = AccountSummary::new("Ivan");
        summary.record(&OutcomeRecord::not_created(&request));
        summary.record(&OutcomeRecord::created(
            &request,
            1,
            "https://vk.com/club1".to_string(),
            PhotoStatus::HavePhoto,
        ));
        summary.record(&OutcomeRecord::created(
            &request,
            2,
            "https://vk.com/club2".to_string(),
            PhotoStatus::NoPhoto,
        ));

        assert_eq!(summary.created, 2);
        assert_eq!(summary.with_photo, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.processed(), 3);
    }

    #[test]
    fn test_fleet_total() {
        let report = FleetReport {
            accounts: vec![
                AccountSummary {
                    account: "a".to_string(),
                    created: 2,
                    with_photo: 1,
                    failed: 0,
                    skipped: 1,
                },
                AccountSummary {
                    account: "b".to_string(),
                    created: 1,
                    with_photo: 1,
                    failed: 3,
                    skipped: 0,
                },
            ],
        };
        let total = report.total();
        assert_eq!(total.created, 3);
        assert_eq!(total.with_photo, 2);
        assert_eq!(total.failed, 3);
        assert_eq!(total.skipped, 1);
    }
}
