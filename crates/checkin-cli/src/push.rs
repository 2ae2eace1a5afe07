use clap::Args;
use cloud_client::{PushDispatcher, ServerChanNotifier, TelegramNotifier, WebhookNotifier};

/// Push channels. Every channel with complete settings receives the report.
#[derive(Debug, Args)]
pub struct PushSettings {
    /// POST the report as JSON `{title, content}` to this URL
    #[arg(long, env = "PUSH_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// ServerChan send key
    #[arg(long, env = "SENDKEY", hide_env_values = true)]
    pub sendkey: Option<String>,

    /// Telegram bot token (requires --tg-chat-id)
    #[arg(long, env = "TG_BOT_TOKEN", hide_env_values = true)]
    pub tg_bot_token: Option<String>,

    /// Telegram chat id
    #[arg(long, env = "TG_CHAT_ID")]
    pub tg_chat_id: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl PushSettings {
    pub fn dispatcher(&self, http: reqwest::Client) -> PushDispatcher {
        let mut dispatcher = PushDispatcher::new();
        if let Some(url) = non_empty(&self.webhook_url) {
            dispatcher = dispatcher.with_channel(WebhookNotifier::new(http.clone(), url));
        }
        if let Some(key) = non_empty(&self.sendkey) {
            dispatcher = dispatcher.with_channel(ServerChanNotifier::new(http.clone(), key));
        }
        match (non_empty(&self.tg_bot_token), non_empty(&self.tg_chat_id)) {
            (Some(token), Some(chat)) => {
                dispatcher = dispatcher.with_channel(TelegramNotifier::new(http, token, chat));
            }
            (Some(_), None) | (None, Some(_)) => {
                tracing::warn!("telegram push needs both TG_BOT_TOKEN and TG_CHAT_ID, skipping");
            }
            (None, None) => {}
        }
        dispatcher
    }
}
