use crate::error::{CheckinError, Result};
use cloud_client::TokenStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TOKEN_DIR: &str = ".token";

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// One set of credentials. The position in the account list decides the
/// account's [`AccountRole`] and when it runs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(default, alias = "userName", alias = "username")]
    pub identifier: String,
    #[serde(default, alias = "password")]
    pub secret: String,
}

impl Account {
    pub fn new(identifier: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            secret: secret.into(),
        }
    }

    /// Accounts missing either credential are skipped without any remote call.
    pub fn is_usable(&self) -> bool {
        !self.identifier.is_empty() && !self.secret.is_empty()
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Primary,
    Secondary,
}

impl AccountRole {
    pub fn is_primary(self) -> bool {
        self == AccountRole::Primary
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Delays that keep the remote service from rate limiting the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Pacing {
    /// Lower bound of the random pause after each account, in ms.
    pub account_min_ms: u64,
    /// Exclusive upper bound of the random pause after each account, in ms.
    pub account_max_ms: u64,
    /// Pause after a primary account's personal sign-in.
    pub after_user_task: Duration,
    /// Pause before the run log is read, letting writers flush.
    pub log_flush: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            account_min_ms: 5000,
            account_max_ms: 8000,
            after_user_task: Duration::from_millis(2000),
            log_flush: Duration::from_millis(1000),
        }
    }
}

impl Pacing {
    /// No delays at all.
    pub fn none() -> Self {
        Self {
            account_min_ms: 0,
            account_max_ms: 0,
            after_user_task: Duration::ZERO,
            log_flush: Duration::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Concurrent family sign-ins for secondary accounts.
    pub exec_threshold: usize,
    /// Number of leading accounts treated as primary.
    pub main_account: usize,
    /// Persist per-account session tokens under `token_dir`.
    pub cache_token: bool,
    pub token_dir: PathBuf,
    /// Family group names to sign in to. Empty means "the first group".
    pub families: Vec<String>,
    pub pacing: Pacing,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            exec_threshold: 1,
            main_account: 1,
            cache_token: false,
            token_dir: PathBuf::from(DEFAULT_TOKEN_DIR),
            families: Vec::new(),
            pacing: Pacing::default(),
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.exec_threshold == 0 {
            return Err(CheckinError::InvalidConfig(
                "EXEC_THRESHOLD must be at least 1".into(),
            ));
        }
        if self.pacing.account_max_ms < self.pacing.account_min_ms {
            return Err(CheckinError::InvalidConfig(format!(
                "account delay range {}..{} is empty",
                self.pacing.account_min_ms, self.pacing.account_max_ms
            )));
        }
        Ok(())
    }

    pub fn role_of(&self, index: usize) -> AccountRole {
        if index < self.main_account {
            AccountRole::Primary
        } else {
            AccountRole::Secondary
        }
    }

    pub fn token_store(&self, account: &Account) -> Option<TokenStore> {
        self.cache_token
            .then(|| TokenStore::new(&self.token_dir, &account.identifier))
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
}

/// Load the account list from a YAML or JSON file (chosen by extension).
pub fn load_accounts(path: &Path) -> Result<Vec<Account>> {
    let data = std::fs::read_to_string(path)?;
    let accounts = if is_json(path) {
        serde_json::from_str(&data)?
    } else {
        serde_yaml::from_str::<Option<Vec<Account>>>(&data)?.unwrap_or_default()
    };
    Ok(accounts)
}

/// Load the family allow-list. A missing file means no allow-list.
pub fn load_families(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let data = std::fs::read_to_string(path)?;
    let families = if is_json(path) {
        serde_json::from_str(&data)?
    } else {
        serde_yaml::from_str::<Option<Vec<String>>>(&data)?.unwrap_or_default()
    };
    Ok(families)
}
