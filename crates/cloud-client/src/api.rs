use async_trait::async_trait;

use crate::token::TokenStore;
use crate::types::{FamilyInfo, FamilySignResult, UserSignResult, UserSizeInfo};
use crate::Result;

// ─── CloudApi ─────────────────────────────────────────────────────────────

/// The remote operations one account's check-in needs.
///
/// Implementations must tolerate concurrent calls on `&self`: family
/// sign-ins are dispatched in parallel against the same client.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// Daily personal sign-in.
    async fn sign_in(&self) -> Result<UserSignResult>;

    /// Family groups the account belongs to, in server order.
    async fn family_list(&self) -> Result<Vec<FamilyInfo>>;

    /// Daily sign-in for one family group.
    async fn family_sign_in(&self, family_id: &str) -> Result<FamilySignResult>;

    /// Current personal and family capacity.
    async fn capacity_info(&self) -> Result<UserSizeInfo>;
}

// ─── ClientFactory ────────────────────────────────────────────────────────

/// Builds a [`CloudApi`] bound to one account's credentials.
///
/// `tokens` is `Some` when session tokens are cached across runs.
pub trait ClientFactory {
    type Client: CloudApi;

    fn connect(
        &self,
        identifier: &str,
        secret: &str,
        tokens: Option<TokenStore>,
    ) -> Result<Self::Client>;
}
