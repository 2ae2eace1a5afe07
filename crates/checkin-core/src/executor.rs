use std::future::Future;

use cloud_client::{CloudApi, FamilyInfo, FamilySignResult, UserSignResult};
use serde::Serialize;

use crate::config::{AccountRole, RunConfig};
use crate::delay::delay;
use crate::error::{CheckinError, Result};
use crate::log::AccountLogger;

// ---------------------------------------------------------------------------
// TaskOutcome
// ---------------------------------------------------------------------------

/// What one sub-task achieved for one account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TaskOutcome {
    /// Calls dispatched.
    pub attempted: usize,
    /// Calls that signed in for the first time today.
    pub not_yet_completed: usize,
    /// Bonus granted by each fresh sign-in, in MiB.
    pub bonus_values: Vec<u64>,
}

impl TaskOutcome {
    fn new(attempted: usize, bonus_values: Vec<u64>) -> Self {
        Self {
            attempted,
            not_yet_completed: bonus_values.len(),
            bonus_values,
        }
    }

    pub fn total_bonus(&self) -> u64 {
        self.bonus_values.iter().sum()
    }

    /// Space-separated bonus list, `0` when nothing was granted.
    pub fn bonus_summary(&self) -> String {
        if self.bonus_values.is_empty() {
            return "0".into();
        }
        self.bonus_values
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Issue `count` calls concurrently and wait until every one has settled.
///
/// One failed call never cancels or hides the others; the results come back
/// in dispatch order.
pub async fn dispatch_all<T, E, F, Fut>(
    count: usize,
    make: F,
) -> Vec<std::result::Result<T, E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    futures::future::join_all((0..count).map(|_| make())).await
}

/// Pick the family group to sign in to.
///
/// With an allow-list, the first group whose display name is listed; without
/// one, the first group the service returned.
pub fn resolve_family<'a>(
    groups: &'a [FamilyInfo],
    allowed: &[String],
) -> Result<&'a FamilyInfo> {
    if allowed.is_empty() {
        return groups.first().ok_or(CheckinError::EmptyFamilyList);
    }
    groups
        .iter()
        .find(|g| {
            g.remark_name
                .as_ref()
                .is_some_and(|name| allowed.contains(name))
        })
        .ok_or(CheckinError::NoMatchingFamily)
}

// ---------------------------------------------------------------------------
// TaskExecutor
// ---------------------------------------------------------------------------

/// Runs one account's check-in sub-tasks against its client.
pub struct TaskExecutor<'a, C: CloudApi> {
    client: &'a C,
    logger: &'a AccountLogger,
    config: &'a RunConfig,
    role: AccountRole,
}

impl<'a, C: CloudApi> TaskExecutor<'a, C> {
    pub fn new(
        client: &'a C,
        logger: &'a AccountLogger,
        config: &'a RunConfig,
        role: AccountRole,
    ) -> Self {
        Self {
            client,
            logger,
            config,
            role,
        }
    }

    /// Personal sign-in, primary accounts only. Returns `None` for secondaries.
    ///
    /// Any failed call fails the task, so connection errors reach the batch loop.
    pub async fn user_task(&self) -> Result<Option<TaskOutcome>> {
        if !self.role.is_primary() {
            return Ok(None);
        }

        let client = self.client;
        let results = dispatch_all(1, move || client.sign_in()).await;
        let attempted = results.len();
        let signed = results
            .into_iter()
            .collect::<std::result::Result<Vec<UserSignResult>, _>>()?;
        let bonuses = signed
            .iter()
            .filter(|res| !res.is_sign)
            .map(|res| res.netdisk_bonus)
            .collect();
        let outcome = TaskOutcome::new(attempted, bonuses);

        self.logger.info(format!(
            "{}/{} personal bonus (M): {}",
            outcome.not_yet_completed,
            outcome.attempted,
            outcome.bonus_summary()
        ));
        delay(self.config.pacing.after_user_task).await;
        Ok(Some(outcome))
    }

    /// Family sign-in for every account.
    ///
    /// Returns `None` when no family group could be targeted; that case is
    /// logged on the account and is not a failure of the account.
    pub async fn family_task(&self) -> Result<Option<TaskOutcome>> {
        let groups = self.client.family_list().await?;
        let family = match resolve_family(&groups, &self.config.families) {
            Ok(family) => family,
            Err(e @ (CheckinError::NoMatchingFamily | CheckinError::EmptyFamilyList)) => {
                self.logger.error(e.to_string());
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let count = if self.role.is_primary() {
            1
        } else {
            self.config.exec_threshold
        };
        let client = self.client;
        let family_id = family.family_id.as_str();
        let results = dispatch_all(count, move || client.family_sign_in(family_id)).await;
        let bonuses = results
            .into_iter()
            .filter_map(|res| match res {
                Ok(res) => Some(res),
                Err(e) => {
                    tracing::debug!(
                        account = %self.logger.channel(),
                        error = %e,
                        "family sign-in call failed"
                    );
                    None
                }
            })
            .filter(FamilySignResult::is_fresh)
            .map(|res| res.bonus_space)
            .collect();
        let outcome = TaskOutcome::new(count, bonuses);

        self.logger.info(format!(
            " {}/{} family bonus (M): {}",
            outcome.not_yet_completed,
            outcome.attempted,
            outcome.bonus_summary()
        ));
        Ok(Some(outcome))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
