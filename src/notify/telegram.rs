// src/notify/telegram.rs

//! Telegram delivery: a form-encoded POST against a bot endpoint.

use serde::Serialize;

/// A resolved Telegram destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramChannel {
    /// Full URL of the bot's `sendMessage` endpoint.
    pub endpoint: String,
    /// Chat id the message is addressed to.
    pub user_id: String,
}

/// Body of the `sendMessage` call, form-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelegramPayload {
    pub chat_id: String,
    pub text: String,
}

impl TelegramChannel {
    pub fn payload(&self, text: &str) -> TelegramPayload {
        TelegramPayload {
            chat_id: self.user_id.clone(),
            text: text.to_string(),
        }
    }

    /// Fire the request. The response body is not interesting, only
    /// transport failures are reported back for logging.
    pub async fn send(&self, client: &reqwest::Client, text: &str) -> reqwest::Result<()> {
        client
            .post(&self.endpoint)
            .form(&self.payload(text))
            .send()
            .await?;

        Ok(())
    }
}
