//! Fleet-wide scheduling of account runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

use super::{AccountOrchestrator, AccountSummary, FleetReport};
use crate::account::Account;
use crate::config::{Config, FleetMode};
use crate::creator::{CreatorConfig, GroupCreator};
use crate::generator::ContentGenerator;
use crate::pacer::Pacer;
use crate::platform::PlatformConnector;
use crate::results::{OutcomeRecord, ResultLog};
use crate::session::SessionManager;
use crate::solver::ChallengeSolver;

/// An account run that is either in flight or already settled.
enum Slot {
    Running(String, JoinHandle<AccountSummary>),
    Done(AccountSummary),
}

/// Starts one account orchestration per account and collects their summaries.
pub struct FleetOrchestrator {
    accounts: Vec<Account>,
    connector: Arc<dyn PlatformConnector>,
    generator: Arc<dyn ContentGenerator>,
    solver: Arc<dyn ChallengeSolver>,
    creator_config: CreatorConfig,
    results_dir: PathBuf,
    between_groups: Duration,
    between_accounts: Duration,
    mode: FleetMode,
    pacer: Pacer,
}

impl FleetOrchestrator {
    pub fn new(
        accounts: Vec<Account>,
        connector: Arc<dyn PlatformConnector>,
        generator: Arc<dyn ContentGenerator>,
        solver: Arc<dyn ChallengeSolver>,
        config: &Config,
        pacer: Pacer,
    ) -> Self {
        Self {
            accounts,
            connector,
            generator,
            solver,
            creator_config: CreatorConfig::from_config(config),
            results_dir: config.output.results_dir.clone(),
            between_groups: config.pacing.between_groups(),
            between_accounts: config.pacing.between_accounts(),
            mode: config.fleet.mode,
            pacer,
        }
    }

    pub fn with_mode(mut self, mode: FleetMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run every account and wait for all of them to finish.
    pub async fn run(self) -> FleetReport {
        let total = self.accounts.len();
        info!("Starting {} accounts ({:?} mode)", total, self.mode);

        let mut slots = Vec::with_capacity(total);
        for (index, account) in self.accounts.iter().enumerate() {
            if self.pacer.is_cancelled() {
                warn!("Cancelled, account '{}' not started", account.name);
                let mut summary = AccountSummary::new(&account.name);
                summary.skipped = account.groups.len();
                slots.push(Slot::Done(summary));
                continue;
            }

            let span = info_span!("account", account = %account.name);
            let slot = match self.prepare(account).instrument(span).await {
                Ok(orchestrator) => match self.mode {
                    FleetMode::Staggered => Slot::Running(
                        account.name.clone(),
                        tokio::spawn(orchestrator.run()),
                    ),
                    FleetMode::Sequential => Slot::Done(orchestrator.run().await),
                },
                Err(summary) => Slot::Done(summary),
            };
            slots.push(slot);

            if index + 1 < total {
                // Cancellation is picked up by the check at the top.
                let _ = self
                    .pacer
                    .pause(self.between_accounts, "before next account")
                    .await;
            }
        }

        let mut report = FleetReport::default();
        for slot in slots {
            let summary = match slot {
                Slot::Done(summary) => summary,
                Slot::Running(name, handle) => match handle.await {
                    Ok(summary) => summary,
                    Err(e) => {
                        error!("Account task for '{}' failed: {}", name, e);
                        AccountSummary::new(name)
                    }
                },
            };
            report.accounts.push(summary);
        }

        let totals = report.total();
        info!(
            "==== All accounts finished: {} created ({} with photo), {} failed, {} skipped ====",
            totals.created, totals.with_photo, totals.failed, totals.skipped
        );
        report
    }

    /// Open the account's result log and connect its platform client.
    ///
    /// When the client cannot be built every request is recorded as not
    /// created and the settled summary is returned instead.
    async fn prepare(&self, account: &Account) -> Result<AccountOrchestrator, AccountSummary> {
        let mut summary = AccountSummary::new(&account.name);

        let log = match ResultLog::open(&self.results_dir, &account.file_stem()).await {
            Ok(log) => log,
            Err(e) => {
                error!("Cannot open result log: {}", e);
                summary.failed = account.groups.len();
                return Err(summary);
            }
        };

        let platform = match self.connector.connect(account) {
            Ok(platform) => platform,
            Err(e) => {
                error!("Cannot set up platform client: {}", e);
                for request in &account.groups {
                    let record = OutcomeRecord::not_created(request);
                    if let Err(e) = log.append(&record).await {
                        error!("Failed to record outcome of '{}': {}", request.name, e);
                    }
                    summary.record(&record);
                }
                return Err(summary);
            }
        };

        let creator = GroupCreator::new(
            platform.clone(),
            self.generator.clone(),
            self.solver.clone(),
            self.creator_config.clone(),
        );

        Ok(AccountOrchestrator::new(
            account.clone(),
            SessionManager::new(platform),
            creator,
            log,
            self.pacer.clone(),
            self.between_groups,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockConnector, MockGenerator, MockSolver};
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    fn fleet(
        dir: &TempDir,
        accounts: Vec<Account>,
        connector: Arc<MockConnector>,
        pacer: Pacer,
    ) -> FleetOrchestrator {
        let config = fixtures::test_config(dir.path());
        FleetOrchestrator::new(
            accounts,
            connector,
            Arc::new(MockGenerator::new()),
            Arc::new(MockSolver::new()),
            &config,
            pacer,
        )
    }

    #[tokio::test]
    async fn test_connect_failure_records_every_request() {
        let dir = TempDir::new().unwrap();
        let connector = Arc::new(MockConnector::new());
        connector.fail_for("Broken");

        let accounts = vec![
            fixtures::account("Broken", &[("A", "t1"), ("B", "t2")]),
            fixtures::account("Fine", &[("C", "t3")]),
        ];
        let report = fleet(&dir, accounts, connector.clone(), Pacer::default())
            .run()
            .await;

        assert_eq!(report.accounts[0].failed, 2);
        assert_eq!(report.accounts[1].created, 1);

        let broken = std::fs::read_to_string(dir.path().join("results/Broken.csv")).unwrap();
        assert!(broken.ends_with("A,t1\nB,t2\n"));
        assert!(connector.platform_for("Broken").create_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_fleet_starts_nothing() {
        let dir = TempDir::new().unwrap();
        let connector = Arc::new(MockConnector::new());
        let token = CancellationToken::new();
        token.cancel();

        let accounts = vec![
            fixtures::account("A", &[("g1", "t1")]),
            fixtures::account("B", &[("g2", "t2"), ("g3", "t3")]),
        ];
        let report = fleet(&dir, accounts, connector, Pacer::new(token)).run().await;

        assert_eq!(report.total().skipped, 3);
        assert_eq!(report.total().processed(), 0);
    }
}
