mod message_builder;
mod sender;

use anyhow::Context;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Delivers messages through the Telegram Bot API `sendMessage` method.
/// The user id doubles as the chat id.
pub struct TelegramBotSender {
    bot_token: String,
    api_base: Url,
    client: Client,
}

impl TelegramBotSender {
    pub fn new(bot_token: String, api_base: &str, timeout: Duration) -> anyhow::Result<Self> {
        let api_base =
            Url::parse(api_base).with_context(|| format!("Invalid Telegram API base: {api_base}"))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Telegram HTTP client")?;

        Ok(Self {
            bot_token,
            api_base,
            client,
        })
    }

    fn build_send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.as_str().trim_end_matches('/'),
            self.bot_token
        )
    }
}
