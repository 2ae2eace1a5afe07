use std::time::Instant;

use cloud_client::{ClientFactory, CloudApi};

use crate::capacity::{CapacityReport, CapacitySnapshot};
use crate::config::{Account, AccountRole, RunConfig};
use crate::delay::{delay, random_pause};
use crate::error::{CheckinError, Result};
use crate::executor::{TaskExecutor, TaskOutcome};
use crate::log::{mask, AccountLogger, RunLog};

// ---------------------------------------------------------------------------
// AccountOutcome
// ---------------------------------------------------------------------------

/// How one account's turn in the batch ended.
#[derive(Debug)]
pub enum AccountOutcome {
    /// Missing identifier or secret; nothing was attempted.
    Skipped,
    Completed {
        /// `None` for secondary accounts.
        user: Option<TaskOutcome>,
        /// `None` when no family group could be targeted.
        family: Option<TaskOutcome>,
    },
    /// A business error; the batch carried on.
    Failed(CheckinError),
    /// A connection-level error; no later account was started.
    Aborted(CheckinError),
}

impl AccountOutcome {
    pub fn is_aborted(&self) -> bool {
        matches!(self, AccountOutcome::Aborted(_))
    }
}

/// Everything the batch produced, in account order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<AccountOutcome>,
    pub reports: Vec<CapacityReport>,
}

impl BatchReport {
    /// The error that stopped the batch, if any.
    pub fn aborted(&self) -> Option<&CheckinError> {
        self.outcomes.iter().find_map(|o| match o {
            AccountOutcome::Aborted(e) => Some(e),
            _ => None,
        })
    }
}

/// A processed account kept for the capacity pass.
struct SnapshotEntry<C> {
    index: usize,
    identifier: String,
    masked: String,
    client: C,
    before: CapacitySnapshot,
    logger: AccountLogger,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Walks the account list one account at a time, then reports capacity
/// changes for the primary accounts.
pub struct Orchestrator<'a, F: ClientFactory> {
    factory: &'a F,
    config: &'a RunConfig,
    log: &'a RunLog,
}

impl<'a, F: ClientFactory> Orchestrator<'a, F> {
    pub fn new(factory: &'a F, config: &'a RunConfig, log: &'a RunLog) -> Self {
        Self {
            factory,
            config,
            log,
        }
    }

    pub async fn run(&self, accounts: &[Account]) -> BatchReport {
        let mut snapshots = Vec::new();
        let mut outcomes = Vec::with_capacity(accounts.len());

        for (index, account) in accounts.iter().enumerate() {
            let outcome = self.run_account(index, account, &mut snapshots).await;
            let aborted = outcome.is_aborted();
            outcomes.push(outcome);
            if aborted {
                tracing::warn!(
                    remaining = accounts.len() - index - 1,
                    "batch aborted on connection error"
                );
                break;
            }
        }

        let reports = self.report_capacity(snapshots).await;
        BatchReport { outcomes, reports }
    }

    async fn run_account(
        &self,
        index: usize,
        account: &Account,
        snapshots: &mut Vec<SnapshotEntry<F::Client>>,
    ) -> AccountOutcome {
        if !account.is_usable() {
            tracing::debug!(index, "skipping account without credentials");
            return AccountOutcome::Skipped;
        }

        let started = Instant::now();
        let masked = mask(&account.identifier, 3, 7);
        let logger = self.log.logger(masked.clone()).with_context("user");
        let role = self.config.role_of(index);
        logger.log(format!("{}. Account {}", index + 1, masked));

        let outcome = match self
            .check_in(index, account, &masked, role, &logger, snapshots)
            .await
        {
            Ok((user, family)) => AccountOutcome::Completed { user, family },
            Err(e) => {
                logger.error(e.to_string());
                if e.is_fatal() {
                    logger.error("Request timed out");
                    AccountOutcome::Aborted(e)
                } else {
                    AccountOutcome::Failed(e)
                }
            }
        };

        logger.log(format!(
            "Elapsed {:.2} s",
            started.elapsed().as_secs_f64()
        ));
        logger.log(" ");
        let pacing = &self.config.pacing;
        delay(random_pause(pacing.account_min_ms, pacing.account_max_ms)).await;
        outcome
    }

    async fn check_in(
        &self,
        index: usize,
        account: &Account,
        masked: &str,
        role: AccountRole,
        logger: &AccountLogger,
        snapshots: &mut Vec<SnapshotEntry<F::Client>>,
    ) -> Result<(Option<TaskOutcome>, Option<TaskOutcome>)> {
        let client = self.factory.connect(
            &account.identifier,
            &account.secret,
            self.config.token_store(account),
        )?;
        let before = CapacitySnapshot::from(client.capacity_info().await?);

        let entry = SnapshotEntry {
            index,
            identifier: account.identifier.clone(),
            masked: masked.to_owned(),
            client,
            before,
            logger: logger.clone(),
        };
        // A repeated identifier replaces the earlier entry but keeps its position.
        let slot = match snapshots
            .iter()
            .position(|e| e.identifier == entry.identifier)
        {
            Some(slot) => {
                snapshots[slot] = entry;
                slot
            }
            None => {
                snapshots.push(entry);
                snapshots.len() - 1
            }
        };

        let executor = TaskExecutor::new(&snapshots[slot].client, logger, self.config, role);
        let user = executor.user_task().await?;
        let family = executor.family_task().await?;
        Ok((user, family))
    }

    /// Second pass: compare each primary account's capacity with its snapshot.
    ///
    /// Visits snapshots in account order and stops after `main_account` entries
    /// or at the first secondary account. Every entry is dropped afterwards.
    async fn report_capacity(
        &self,
        snapshots: Vec<SnapshotEntry<F::Client>>,
    ) -> Vec<CapacityReport> {
        let mut reports = Vec::new();
        for entry in snapshots.into_iter().take(self.config.main_account) {
            if !self.config.role_of(entry.index).is_primary() {
                break;
            }
            let after = match entry.client.capacity_info().await {
                Ok(info) => CapacitySnapshot::from(info),
                Err(e) => {
                    entry
                        .logger
                        .error(format!("Capacity query failed: {e}"));
                    if e.is_fatal() {
                        break;
                    }
                    continue;
                }
            };
            let report = CapacityReport::new(entry.masked, entry.before, after);
            for line in report.lines() {
                entry.logger.log(line);
            }
            reports.push(report);
        }
        reports
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
