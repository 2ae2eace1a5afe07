//! `cloud-client`: remote collaborators of the check-in runner.
//!
//! The batch runner in `checkin-core` only talks to the traits defined here,
//! so it can be driven by test doubles. This crate also ships the concrete
//! HTTP implementations used by the `checkin` binary.
//!
//! # Architecture
//!
//! ```text
//! ClientFactory ── connect(identifier, secret, TokenStore?) ──▶ CloudApi
//!                                                               │
//!                      sign_in / family_list / family_sign_in / capacity_info
//!
//! PushDispatcher ── Notifier ──▶ webhook | ServerChan | Telegram
//! ```

pub mod api;
pub mod error;
pub mod http;
pub mod push;
pub mod token;
pub mod types;

pub use api::{ClientFactory, CloudApi};
pub use error::CloudError;
pub use http::{HttpClientFactory, HttpCloudClient};
pub use push::{
    Notifier, PushDispatcher, PushMessage, ServerChanNotifier, TelegramNotifier, WebhookNotifier,
};
pub use token::TokenStore;
pub use types::{CapacityInfo, FamilyInfo, FamilySignResult, UserSignResult, UserSizeInfo};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, CloudError>;
