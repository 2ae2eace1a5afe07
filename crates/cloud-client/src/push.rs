use async_trait::async_trait;
use serde::Serialize;

use crate::{CloudError, Result};

pub const SERVERCHAN_BASE_URL: &str = "https://sctapi.ftqq.com";
pub const TELEGRAM_BASE_URL: &str = "https://api.telegram.org";

// ─── PushMessage ──────────────────────────────────────────────────────────

/// The notification sent at the end of a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
}

// ─── Notifier ─────────────────────────────────────────────────────────────

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in logs.
    fn name(&self) -> &str;

    async fn send(&self, message: &PushMessage) -> Result<()>;
}

async fn check(channel: &str, resp: reqwest::Response) -> Result<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(CloudError::Push {
        channel: channel.to_owned(),
        reason: format!("{}, {}", status.as_u16(), body),
    })
}

// ─── Webhook ──────────────────────────────────────────────────────────────

/// POSTs `{"title": .., "content": ..}` to an arbitrary URL.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        WebhookNotifier {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, message: &PushMessage) -> Result<()> {
        let resp = self
            .http
            .post(&self.url)
            .json(&serde_json::json!({
                "title": message.title,
                "content": message.body,
            }))
            .send()
            .await?;
        check(self.name(), resp).await
    }
}

// ─── ServerChan ───────────────────────────────────────────────────────────

pub struct ServerChanNotifier {
    http: reqwest::Client,
    send_key: String,
    base_url: String,
}

impl ServerChanNotifier {
    pub fn new(http: reqwest::Client, send_key: impl Into<String>) -> Self {
        Self::with_base_url(http, send_key, SERVERCHAN_BASE_URL)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        send_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        ServerChanNotifier {
            http,
            send_key: send_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for ServerChanNotifier {
    fn name(&self) -> &str {
        "serverchan"
    }

    async fn send(&self, message: &PushMessage) -> Result<()> {
        let url = format!("{}/{}.send", self.base_url, self.send_key);
        let resp = self
            .http
            .post(url)
            .form(&[
                ("title", message.title.as_str()),
                ("desp", message.body.as_str()),
            ])
            .send()
            .await?;
        check(self.name(), resp).await
    }
}

// ─── Telegram ─────────────────────────────────────────────────────────────

pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
    base_url: String,
}

impl TelegramNotifier {
    pub fn new(
        http: reqwest::Client,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self::with_base_url(http, bot_token, chat_id, TELEGRAM_BASE_URL)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        TelegramNotifier {
            http,
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, message: &PushMessage) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let resp = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": format!("{}\n\n{}", message.title, message.body),
            }))
            .send()
            .await?;
        check(self.name(), resp).await
    }
}

// ─── PushDispatcher ───────────────────────────────────────────────────────

/// Fans one message out to every configured channel.
///
/// A failing channel is logged and does not stop the others. Sending fails
/// only when channels exist and none of them delivered.
#[derive(Default)]
pub struct PushDispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl PushDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel: impl Notifier + 'static) -> Self {
        self.channels.push(Box::new(channel));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Send to every channel and return how many accepted the message.
    pub async fn dispatch(&self, message: &PushMessage) -> usize {
        let results = futures::future::join_all(
            self.channels
                .iter()
                .map(|channel| async move { (channel.name(), channel.send(message).await) }),
        )
        .await;

        let mut delivered = 0;
        for (name, result) in results {
            match result {
                Ok(()) => {
                    tracing::info!(channel = name, "notification sent");
                    delivered += 1;
                }
                Err(e) => tracing::warn!(channel = name, error = %e, "notification failed"),
            }
        }
        delivered
    }
}

#[async_trait]
impl Notifier for PushDispatcher {
    fn name(&self) -> &str {
        "dispatcher"
    }

    async fn send(&self, message: &PushMessage) -> Result<()> {
        if self.channels.is_empty() {
            tracing::info!("no push channel configured, skipping notification");
            return Ok(());
        }
        if self.dispatch(message).await == 0 {
            return Err(CloudError::Push {
                channel: self.name().to_owned(),
                reason: "every channel failed".into(),
            });
        }
        Ok(())
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────
