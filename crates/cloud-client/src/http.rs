use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::api::{ClientFactory, CloudApi};
use crate::token::TokenStore;
use crate::types::{
    FamilyInfo, FamilyListResponse, FamilySignResult, LoginRequest, LoginResponse,
    UserSignResult, UserSizeInfo,
};
use crate::{CloudError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ─── HttpClientFactory ────────────────────────────────────────────────────

/// Builds [`HttpCloudClient`]s that share one connection pool.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClientFactory {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpClientFactory {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }
}

impl ClientFactory for HttpClientFactory {
    type Client = HttpCloudClient;

    fn connect(
        &self,
        identifier: &str,
        secret: &str,
        tokens: Option<TokenStore>,
    ) -> Result<HttpCloudClient> {
        Ok(HttpCloudClient {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            identifier: identifier.to_owned(),
            secret: secret.to_owned(),
            tokens,
            token: Mutex::new(None),
        })
    }
}

// ─── HttpCloudClient ──────────────────────────────────────────────────────

/// JSON-over-HTTP implementation of [`CloudApi`].
///
/// Logs in lazily on the first call and reuses the bearer token for every
/// call after it. A `401` drops the token, logs in again and retries the
/// call once.
pub struct HttpCloudClient {
    http: reqwest::Client,
    base_url: String,
    identifier: String,
    secret: String,
    tokens: Option<TokenStore>,
    token: Mutex<Option<String>>,
}

impl HttpCloudClient {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            return Ok(token.clone());
        }
        if let Some(token) = self.tokens.as_ref().and_then(TokenStore::load) {
            *guard = Some(token.clone());
            return Ok(token);
        }

        let token = self.login().await?;
        if let Some(store) = &self.tokens {
            if let Err(e) = store.save(&token) {
                tracing::warn!(error = %e, "failed to persist access token");
            }
        }
        *guard = Some(token.clone());
        Ok(token)
    }

    async fn login(&self) -> Result<String> {
        tracing::debug!("logging in");
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&LoginRequest {
                username: &self.identifier,
                password: &self.secret,
            })
            .send()
            .await?;
        let login: LoginResponse = decode(resp).await?;
        Ok(login.access_token)
    }

    /// Forget `rejected` unless a concurrent call already replaced it.
    async fn invalidate(&self, rejected: &str) {
        let mut guard = self.token.lock().await;
        if guard.as_deref() == Some(rejected) {
            *guard = None;
        }
        if let Some(store) = &self.tokens {
            if store.load().as_deref() == Some(rejected) {
                if let Err(e) = store.clear() {
                    tracing::warn!(error = %e, "failed to clear stale access token");
                }
            }
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let token = self.access_token().await?;
        let resp = self.send_get(path, query, &token).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return decode(resp).await;
        }

        tracing::debug!(path, "access token rejected, logging in again");
        self.invalidate(&token).await;
        let token = self.access_token().await?;
        decode(self.send_get(path, query, &token).await?).await
    }

    async fn send_get(
        &self,
        path: &str,
        query: &[(&str, &str)],
        token: &str,
    ) -> Result<reqwest::Response> {
        Ok(self
            .http
            .get(self.url(path))
            .query(query)
            .bearer_auth(token)
            .send()
            .await?)
    }
}

#[async_trait]
impl CloudApi for HttpCloudClient {
    async fn sign_in(&self) -> Result<UserSignResult> {
        self.get("/user/sign", &[]).await
    }

    async fn family_list(&self) -> Result<Vec<FamilyInfo>> {
        let resp: FamilyListResponse = self.get("/family/list", &[]).await?;
        Ok(resp.family_info_resp.unwrap_or_default())
    }

    async fn family_sign_in(&self, family_id: &str) -> Result<FamilySignResult> {
        self.get("/family/sign", &[("familyId", family_id)]).await
    }

    async fn capacity_info(&self) -> Result<UserSizeInfo> {
        self.get("/user/size", &[]).await
    }
}

async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CloudError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json::<T>().await?)
}

// ─── Tests ────────────────────────────────────────────────────────────────
