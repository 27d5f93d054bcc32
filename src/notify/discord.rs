// src/notify/discord.rs

//! Discord delivery: a JSON POST against a webhook URL.

use serde::Serialize;

/// A resolved Discord webhook destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscordChannel {
    pub webhook_url: String,
}

/// Webhook body; Discord only needs the message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscordPayload {
    pub content: String,
}

impl DiscordChannel {
    pub fn payload(&self, text: &str) -> DiscordPayload {
        DiscordPayload {
            content: text.to_string(),
        }
    }

    /// Fire the request, reporting only transport failures.
    pub async fn send(&self, client: &reqwest::Client, text: &str) -> reqwest::Result<()> {
        client
            .post(&self.webhook_url)
            .json(&self.payload(text))
            .send()
            .await?;

        Ok(())
    }
}
