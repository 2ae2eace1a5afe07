//! One complete scheduled run: the account batch, the notification, and the
//! log cleanup that follows it.

use cloud_client::{ClientFactory, Notifier, PushMessage};

use crate::capacity::CapacityReport;
use crate::config::{Account, RunConfig};
use crate::delay::delay;
use crate::error::CheckinError;
use crate::log::RunLog;
use crate::notify::build_notification;
use crate::orchestrator::{AccountOutcome, Orchestrator};

/// What a run did, kept after the log itself has been erased.
#[derive(Debug)]
pub struct RunSummary {
    pub outcomes: Vec<AccountOutcome>,
    pub reports: Vec<CapacityReport>,
    pub notification: PushMessage,
    /// Whether the notifier accepted the message.
    pub notified: bool,
}

impl RunSummary {
    pub fn aborted(&self) -> Option<&CheckinError> {
        self.outcomes.iter().find_map(|o| match o {
            AccountOutcome::Aborted(e) => Some(e),
            _ => None,
        })
    }

    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AccountOutcome::Completed { .. }))
            .count()
    }

    /// Bonus granted across every completed account, in MiB.
    pub fn bonus_mib(&self) -> u64 {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                AccountOutcome::Completed { user, family } => Some(
                    user.iter()
                        .chain(family.iter())
                        .map(|t| t.total_bonus())
                        .sum::<u64>(),
                ),
                _ => None,
            })
            .sum()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, AccountOutcome::Failed(_)))
            .count()
    }
}

/// Run the batch, push the collected log, then clear it.
///
/// Push and cleanup happen on every path, including after a fatal error
/// stopped the batch. A push failure is logged and does not skip cleanup.
pub async fn run<F: ClientFactory>(
    accounts: &[Account],
    config: &RunConfig,
    factory: &F,
    notifier: &dyn Notifier,
    log: &RunLog,
) -> RunSummary {
    tracing::info!(accounts = accounts.len(), "starting check-in run");
    let batch = Orchestrator::new(factory, config, log).run(accounts).await;

    // let asynchronous log writers settle before the log is read back
    delay(config.pacing.log_flush).await;

    let notification = build_notification(log, &batch.reports);
    let notified = match notifier.send(&notification).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(channel = notifier.name(), error = %e, "push failed");
            false
        }
    };

    log.erase();
    if let Err(e) = log.clean() {
        tracing::warn!(error = %e, "failed to clean run log");
    }

    let summary = RunSummary {
        outcomes: batch.outcomes,
        reports: batch.reports,
        notification,
        notified,
    };
    tracing::info!(
        completed = summary.completed(),
        failed = summary.failed(),
        aborted = summary.aborted().is_some(),
        bonus_mib = summary.bonus_mib(),
        notified,
        "run finished"
    );
    summary
}
