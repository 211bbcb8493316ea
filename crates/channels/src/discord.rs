//! Discord channel adapter (stub).
//!
//! Implements the Channel trait for the Discord Bot API. The gateway
//! connection is not wired up yet; inbound messages are injected in-process
//! and outbound messages are recorded, which is what the dispatch loop and
//! its tests rely on.

use async_trait::async_trait;
use raven_config::DiscordSettings;
use raven_core::channel::{Card, Channel, ChannelId, ChannelMessage};
use raven_core::error::ChannelError;
use tokio::sync::{Mutex, mpsc};
use tracing::info;

/// Discord channel configuration.
#[derive(Clone)]
pub struct DiscordConfig {
    /// Bot token from Discord Developer Portal.
    pub bot_token: String,
    /// Allowed user IDs. Empty = deny all, ["*"] = allow all.
    pub allowed_users: Vec<String>,
    /// "Listening to ..." presence shown once connected.
    pub presence: String,
}

impl DiscordConfig {
    pub fn from_settings(settings: &DiscordSettings) -> Self {
        Self {
            bot_token: settings.bot_token.clone().unwrap_or_default(),
            allowed_users: settings.allowed_users.clone(),
            presence: settings.presence.clone(),
        }
    }
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("bot_token", &"[REDACTED]")
            .field("allowed_users", &self.allowed_users)
            .field("presence", &self.presence)
            .finish()
    }
}

/// A message the channel delivered.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Text { chat_id: String, content: String },
    Card { chat_id: String, card: Card },
}

/// Discord channel adapter.
pub struct DiscordChannel {
    config: DiscordConfig,
    channel_id: ChannelId,
    inject_tx: Mutex<Option<mpsc::Sender<Result<ChannelMessage, ChannelError>>>>,
    outbox: Mutex<Vec<Outbound>>,
}

impl DiscordChannel {
    pub fn new(config: DiscordConfig) -> Self {
        Self {
            config,
            channel_id: ChannelId("discord".into()),
            inject_tx: Mutex::new(None),
            outbox: Mutex::new(Vec::new()),
        }
    }

    /// Inject a message as if it came from Discord.
    pub async fn inject_message(&self, msg: ChannelMessage) -> Result<(), ChannelError> {
        let guard = self.inject_tx.lock().await;
        if let Some(tx) = guard.as_ref() {
            tx.send(Ok(msg))
                .await
                .map_err(|_| ChannelError::ConnectionLost("Message channel closed".into()))
        } else {
            Err(ChannelError::ConnectionLost("Channel not started".into()))
        }
    }

    /// Everything sent so far, oldest first.
    pub async fn sent(&self) -> Vec<Outbound> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl Channel for DiscordChannel {
    fn name(&self) -> &str {
        "discord"
    }

    fn id(&self) -> &ChannelId {
        &self.channel_id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        if self.config.bot_token.is_empty() {
            return Err(ChannelError::NotConfigured("Discord token is required".into()));
        }
        info!(presence = %self.config.presence, "Discord channel starting (stub mode)");
        let (tx, rx) = mpsc::channel(64);
        *self.inject_tx.lock().await = Some(tx);
        Ok(rx)
    }

    async fn send(&self, chat_id: &str, content: &str) -> Result<(), ChannelError> {
        info!(chat_id = %chat_id, content_len = content.len(), "Discord send (stub)");
        self.outbox.lock().await.push(Outbound::Text {
            chat_id: chat_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn send_card(&self, chat_id: &str, card: &Card) -> Result<(), ChannelError> {
        info!(chat_id = %chat_id, title = %card.title, "Discord embed (stub)");
        self.outbox.lock().await.push(Outbound::Card {
            chat_id: chat_id.to_string(),
            card: card.clone(),
        });
        Ok(())
    }

    async fn send_typing(&self, chat_id: &str) -> Result<(), ChannelError> {
        info!(chat_id = %chat_id, "Discord typing (stub)");
        Ok(())
    }

    fn is_allowed(&self, sender_id: &str) -> bool {
        if self.config.allowed_users.is_empty() {
            return false;
        }
        if self.config.allowed_users.iter().any(|u| u == "*") {
            return true;
        }
        self.config.allowed_users.iter().any(|u| u == sender_id)
    }

    async fn stop(&self) -> Result<(), ChannelError> {
        info!("Discord channel stopping");
        *self.inject_tx.lock().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, ChannelError> {
        Ok(!self.config.bot_token.is_empty())
    }
}
