//! Sequential processing of one account's group queue.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{error, info, info_span, warn, Instrument};

use super::AccountSummary;
use crate::account::{Account, GroupRequest};
use crate::creator::GroupCreator;
use crate::metrics;
use crate::pacer::Pacer;
use crate::results::{OutcomeRecord, ResultLog};
use crate::session::SessionManager;

/// Drives one account through its group requests, one at a time.
pub struct AccountOrchestrator {
    account: Account,
    sessions: SessionManager,
    creator: GroupCreator,
    log: ResultLog,
    pacer: Pacer,
    between_groups: Duration,
}

impl AccountOrchestrator {
    pub fn new(
        account: Account,
        sessions: SessionManager,
        creator: GroupCreator,
        log: ResultLog,
        pacer: Pacer,
        between_groups: Duration,
    ) -> Self {
        Self {
            account,
            sessions,
            creator,
            log,
            pacer,
            between_groups,
        }
    }

    /// Process every request in order, recording exactly one outcome each.
    ///
    /// All events emitted while running carry the `account` span.
    pub async fn run(self) -> AccountSummary {
        let span = info_span!("account", account = %self.account.name);
        self.run_queue().instrument(span).await
    }

    async fn run_queue(self) -> AccountSummary {
        let total = self.account.groups.len();
        let mut summary = AccountSummary::new(&self.account.name);
        info!("Starting account with {} group requests", total);

        for (index, request) in self.account.groups.iter().enumerate() {
            if self.pacer.is_cancelled() {
                summary.skipped = total - index;
                warn!("Cancelled, skipping {} remaining groups", summary.skipped);
                break;
            }

            info!(
                "Processing group {}/{}: '{}' ({})",
                index + 1,
                total,
                request.name,
                request.topic
            );

            let started = Instant::now();
            let record = self.process_request(request).await;
            let label = record.label();
            metrics::GROUPS_PROCESSED.with_label_values(&[label]).inc();
            metrics::GROUP_DURATION
                .with_label_values(&[label])
                .observe(started.elapsed().as_secs_f64());

            summary.record(&record);
            if let Err(e) = self.log.append(&record).await {
                error!("Failed to record outcome of '{}': {}", request.name, e);
            }

            if index + 1 < total
                && self
                    .pacer
                    .pause(self.between_groups, "before next group")
                    .await
                    .is_err()
            {
                summary.skipped = total - index - 1;
                warn!("Cancelled, skipping {} remaining groups", summary.skipped);
                break;
            }
        }

        info!(
            "---- Account finished: {} created ({} with photo), {} failed, {} skipped ----",
            summary.created, summary.with_photo, summary.failed, summary.skipped
        );
        summary
    }

    async fn process_request(&self, request: &GroupRequest) -> OutcomeRecord {
        let work = async {
            let session = match self.sessions.refresh().await {
                Ok(session) => session,
                Err(e) => {
                    error!("Skipping group '{}': {}", request.name, e);
                    return OutcomeRecord::not_created(request);
                }
            };
            self.creator.process(&session, request).await
        };

        match AssertUnwindSafe(work).catch_unwind().await {
            Ok(record) => record,
            Err(panic) => {
                error!(
                    "Processing of group '{}' panicked: {}",
                    request.name,
                    panic_message(panic.as_ref())
                );
                OutcomeRecord::not_created(request)
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
