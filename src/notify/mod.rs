// src/notify/mod.rs

//! Outbound status notifications.
//!
//! Every lifecycle milestone (worker up, instance created, failure,
//! interrupt, suspend) is reported to whichever chat channels are
//! configured in the environment. Dispatch is fire-and-forget: each send
//! runs in a detached Tokio task with a short timeout, and a failed send is
//! logged and dropped. The run's outcome never depends on a webhook.

pub mod discord;
pub mod telegram;

pub use discord::DiscordChannel;
pub use telegram::TelegramChannel;

use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::errors::{Error, Result};

/// Env var holding the Telegram bot endpoint URL.
pub const TELEGRAM_POST_VAR: &str = "TELEGRAM_POST";
/// Env var holding the Telegram chat id to address.
pub const TELEGRAM_USER_VAR: &str = "TELEGRAM_USER_ID";
/// Env var holding a Discord webhook URL.
pub const DISCORD_WEBHOOK_VAR: &str = "DISCORD_WEBHOOK_URL";

/// Per-request deadline; a slow webhook must not hold anything up.
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// The channels a message fans out to.
///
/// Empty is fine: notifications are an optional layer, and a run without
/// any configured channel just logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelConfig {
    pub telegram: Option<TelegramChannel>,
    pub discord: Option<DiscordChannel>,
}

impl ChannelConfig {
    /// Resolve channels through `lookup`, typically a chain of process env
    /// and sourced env file. A channel is active only when all of its
    /// variables are present.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let telegram = match (lookup(TELEGRAM_POST_VAR), lookup(TELEGRAM_USER_VAR)) {
            (Some(endpoint), Some(user_id)) => Some(TelegramChannel { endpoint, user_id }),
            _ => None,
        };
        let discord = lookup(DISCORD_WEBHOOK_VAR).map(|webhook_url| DiscordChannel { webhook_url });

        Self { telegram, discord }
    }

    pub fn from_process_env() -> Self {
        Self::resolve(|key| std::env::var(key).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.telegram.is_none() && self.discord.is_none()
    }

    /// Names of the active channels, for logging.
    pub fn active(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.telegram.is_some() {
            names.push("telegram");
        }
        if self.discord.is_some() {
            names.push("discord");
        }
        names
    }
}

/// Fans messages out to the configured channels without blocking the caller.
pub struct Notifier {
    channels: ChannelConfig,
    client: reqwest::Client,
    tasks: TaskTracker,
}

impl Notifier {
    pub fn new(channels: ChannelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(Error::from)?;

        Ok(Self {
            channels,
            client,
            tasks: TaskTracker::new(),
        })
    }

    /// Swap in freshly resolved channels, e.g. after the env file is read.
    pub fn set_channels(&mut self, channels: ChannelConfig) {
        if channels != self.channels {
            debug!(active = ?channels.active(), "notification channels updated");
        }
        self.channels = channels;
    }

    pub fn channels(&self) -> &ChannelConfig {
        &self.channels
    }

    /// Send `message` to every configured channel.
    ///
    /// Returns immediately; the requests run detached and failures are
    /// logged, never propagated.
    pub fn notify(&self, message: &str) {
        if self.channels.is_empty() {
            debug!("no notification channels configured, dropping message");
            return;
        }

        if let Some(channel) = self.channels.telegram.clone() {
            let client = self.client.clone();
            let text = message.to_string();
            self.tasks.spawn(async move {
                if let Err(err) = channel.send(&client, &text).await {
                    warn!(error = %err, "telegram notification failed");
                }
            });
        }

        if let Some(channel) = self.channels.discord.clone() {
            let client = self.client.clone();
            let text = message.to_string();
            self.tasks.spawn(async move {
                if let Err(err) = channel.send(&client, &text).await {
                    warn!(error = %err, "discord notification failed");
                }
            });
        }
    }

    /// Give in-flight sends a bounded window to finish.
    ///
    /// Called once when the run is over; a send that outlives the grace
    /// period is abandoned along with the process.
    pub async fn settle(&self, grace: Duration) {
        self.tasks.close();
        if tokio::time::timeout(grace, self.tasks.wait()).await.is_err() {
            warn!("notification still in flight at shutdown, abandoning it");
        }
    }
}
