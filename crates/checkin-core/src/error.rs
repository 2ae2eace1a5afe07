use cloud_client::CloudError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckinError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("account is not a member of any allowed family group")]
    NoMatchingFamily,

    #[error("account has no family group")]
    EmptyFamilyList,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CheckinError {
    /// `true` when the batch must stop: the remote session is unusable for
    /// the accounts that follow.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CheckinError::Cloud(e) if e.is_fatal())
    }
}

pub type Result<T> = std::result::Result<T, CheckinError>;
