use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

// ─── TokenStore ───────────────────────────────────────────────────────────

/// Persists one account's access token on disk so later runs can skip login.
///
/// The token lives at `<token_dir>/<identifier>.json`. The directory is
/// created lazily on the first `save`.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredToken {
    access_token: String,
    saved_at: DateTime<Utc>,
}

impl TokenStore {
    pub fn new(token_dir: &Path, identifier: &str) -> Self {
        TokenStore {
            path: token_dir.join(format!("{identifier}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the stored token, or `None` if none exists or it is unreadable.
    pub fn load(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let stored: StoredToken = serde_json::from_str(&raw).ok()?;
        Some(stored.access_token).filter(|t| !t.is_empty())
    }

    pub fn save(&self, access_token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let stored = StoredToken {
            access_token: access_token.to_owned(),
            saved_at: Utc::now(),
        };
        std::fs::write(&self.path, serde_json::to_vec_pretty(&stored)?)?;
        Ok(())
    }

    /// Delete the stored token (no-op if none exists).
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
