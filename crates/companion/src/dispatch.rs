//! Dispatch loop — connects a [`Channel`] to the companion.
//!
//! Per inbound message: drop the bot's own messages and senders outside the
//! allowlist, answer prefix commands, then run a conversation turn when the
//! routing rules say so. A DM or mention that is also a command gets both
//! replies. Every message is handled in its own task so a slow backend call
//! for one user does not hold up another.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use raven_channels::{parse_command, should_respond, truncate_reply};
use raven_config::DiscordSettings;
use raven_core::channel::{Channel, ChannelMessage};
use raven_core::error::ChannelError;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::commands::{CommandSet, Reply};
use crate::composer::ResponseComposer;
use crate::persona::TURN_FAILURE_REPLY;

/// Routing knobs taken from the `[discord]` config table.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub command_prefix: String,
    /// Messages from this sender id are the bot's own and are ignored.
    pub bot_user_id: Option<String>,
    pub max_message_length: usize,
}

impl DispatchSettings {
    pub fn from_settings(settings: &DiscordSettings) -> Self {
        Self {
            command_prefix: settings.command_prefix.clone(),
            bot_user_id: settings.bot_user_id.clone(),
            max_message_length: settings.max_message_length,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_settings(&DiscordSettings::default())
    }
}

/// How a single inbound message was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    OwnMessage,
    NotAllowed,
    Command(String),
    Conversation,
    CommandAndConversation(String),
    Ignored,
}

pub struct Dispatcher {
    composer: Arc<ResponseComposer>,
    commands: Arc<CommandSet>,
    settings: DispatchSettings,
    in_flight: AtomicUsize,
}

impl Dispatcher {
    pub fn new(
        composer: Arc<ResponseComposer>,
        commands: Arc<CommandSet>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            composer,
            commands,
            settings,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn composer(&self) -> &Arc<ResponseComposer> {
        &self.composer
    }

    /// Message tasks spawned by [`serve`](Self::serve) that have not been
    /// reaped yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Handle one inbound message, sending any reply through `channel`.
    pub async fn handle(
        &self,
        channel: &dyn Channel,
        msg: ChannelMessage,
    ) -> Result<Handled, ChannelError> {
        if self.settings.bot_user_id.as_deref() == Some(msg.sender_id.as_str()) {
            return Ok(Handled::OwnMessage);
        }
        if !channel.is_allowed(&msg.sender_id) {
            warn!(channel = channel.name(), sender_id = %msg.sender_id, "Sender not in allowlist");
            return Ok(Handled::NotAllowed);
        }

        let command = parse_command(&msg.content, &self.settings.command_prefix);
        if let Some((name, args)) = &command {
            debug!(command = %name, sender_id = %msg.sender_id, "Running command");
            match self.commands.handle(name, args.as_deref(), msg.display_name()) {
                Reply::Text(text) => {
                    let text = truncate_reply(&text, self.settings.max_message_length);
                    channel.send(&msg.chat_id, &text).await?;
                }
                Reply::Card(card) => channel.send_card(&msg.chat_id, &card).await?,
            }
        }
        let command = command.map(|(name, _)| name);

        if !should_respond(&msg, &self.settings.command_prefix) {
            return Ok(command.map_or(Handled::Ignored, Handled::Command));
        }

        if let Err(e) = channel.send_typing(&msg.chat_id).await {
            debug!(error = %e, "Typing indicator failed");
        }
        let reply = self
            .composer
            .respond(&msg.sender_id, msg.display_name(), &msg.content)
            .await;
        let reply = truncate_reply(&reply, self.settings.max_message_length);
        channel.send(&msg.chat_id, &reply).await?;
        Ok(command.map_or(Handled::Conversation, Handled::CommandAndConversation))
    }

    /// Start `channel` and serve it until its stream ends.
    pub async fn run(self: Arc<Self>, channel: Arc<dyn Channel>) -> Result<(), ChannelError> {
        let rx = channel.start().await?;
        self.serve(channel, rx).await;
        Ok(())
    }

    /// Serve an already started channel. Returns once the stream is closed
    /// and every in-flight turn has finished.
    pub async fn serve(
        self: Arc<Self>,
        channel: Arc<dyn Channel>,
        mut rx: mpsc::Receiver<Result<ChannelMessage, ChannelError>>,
    ) {
        info!(channel = channel.name(), "Dispatch loop started");
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                inbound = rx.recv() => match inbound {
                    Some(Ok(msg)) => {
                        tasks.spawn(Self::handle_isolated(self.clone(), channel.clone(), msg));
                    }
                    Some(Err(e)) => warn!(channel = channel.name(), error = %e, "Inbound error"),
                    None => break,
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
            while tasks.try_join_next().is_some() {}
            self.in_flight.store(tasks.len(), Ordering::Relaxed);
        }

        while tasks.join_next().await.is_some() {
            self.in_flight.store(tasks.len(), Ordering::Relaxed);
        }
        info!(channel = channel.name(), "Dispatch loop stopped");
    }

    /// Run `handle` in its own task so a panic inside a turn still produces
    /// a reply instead of silence.
    async fn handle_isolated(self: Arc<Self>, channel: Arc<dyn Channel>, msg: ChannelMessage) {
        let chat_id = msg.chat_id.clone();
        let inner = {
            let channel = channel.clone();
            tokio::spawn(async move { self.handle(channel.as_ref(), msg).await })
        };
        match inner.await {
            Ok(Ok(handled)) => debug!(?handled, "Message handled"),
            Ok(Err(e)) => warn!(chat_id = %chat_id, error = %e, "Reply delivery failed"),
            Err(e) => {
                error!(chat_id = %chat_id, error = %e, "Turn task failed");
                if let Err(e) = channel.send(&chat_id, TURN_FAILURE_REPLY).await {
                    warn!(chat_id = %chat_id, error = %e, "Failure reply not delivered");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, GenerationBackend};
    use crate::composer::GenerationSettings;
    use crate::lookup::LookupEngine;
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use raven_channels::{DiscordChannel, DiscordConfig, Outbound};
    use raven_core::channel::ChannelId;

    struct EchoBackend;

    #[async_trait]
    impl GenerationBackend for EchoBackend {
        async fn generate(&self, _: &str, user: &str, _: u32, _: f32) -> Result<String, BackendError> {
            if user.contains("PANIC") {
                panic!("backend exploded");
            }
            Ok("echo".into())
        }
    }

    fn dispatcher(settings: DispatchSettings) -> Arc<Dispatcher> {
        let lookup = Arc::new(LookupEngine::seeded(2));
        let composer = Arc::new(ResponseComposer::new(
            lookup.clone(),
            Arc::new(EchoBackend),
            GenerationSettings::default(),
        ));
        let commands = Arc::new(CommandSet::new(lookup, StdRng::seed_from_u64(2), "!"));
        Arc::new(Dispatcher::new(composer, commands, settings))
    }

    fn settings() -> DispatchSettings {
        DispatchSettings {
            command_prefix: "!".into(),
            bot_user_id: Some("raven-bot".into()),
            max_message_length: 2000,
        }
    }

    fn channel(allowed: &[&str]) -> DiscordChannel {
        DiscordChannel::new(DiscordConfig {
            bot_token: "token".into(),
            allowed_users: allowed.iter().map(|s| s.to_string()).collect(),
            presence: "My Chemical Romance 🖤".into(),
        })
    }

    fn guild_msg(sender: &str, content: &str) -> ChannelMessage {
        ChannelMessage {
            channel_id: ChannelId("discord".into()),
            sender_id: sender.into(),
            sender_name: Some("Ash".into()),
            content: content.into(),
            chat_id: "general".into(),
            is_direct_message: false,
            bot_mentioned: false,
            metadata: serde_json::Map::new(),
        }
    }

    #[tokio::test]
    async fn own_messages_are_ignored() {
        let d = dispatcher(settings());
        let ch = channel(&["*"]);
        let handled = d.handle(&ch, guild_msg("raven-bot", "hello everyone")).await.unwrap();
        assert_eq!(handled, Handled::OwnMessage);
        assert!(ch.sent().await.is_empty());
    }

    #[tokio::test]
    async fn senders_outside_allowlist_are_ignored() {
        let d = dispatcher(settings());
        let ch = channel(&["friend"]);
        let handled = d.handle(&ch, guild_msg("stranger", "hello everyone")).await.unwrap();
        assert_eq!(handled, Handled::NotAllowed);
        assert!(ch.sent().await.is_empty());
    }

    #[tokio::test]
    async fn dm_command_also_gets_a_conversation_turn() {
        let d = dispatcher(settings());
        let ch = channel(&["*"]);
        let mut msg = guild_msg("u1", "!recommend metal");
        msg.is_direct_message = true;

        let handled = d.handle(&ch, msg).await.unwrap();
        assert_eq!(handled, Handled::CommandAndConversation("recommend".into()));

        let sent = ch.sent().await;
        assert_eq!(sent.len(), 2);
        let Outbound::Text { content, .. } = &sent[0] else {
            panic!("expected text");
        };
        assert!(content.contains("Here's some metal"));
        assert!(matches!(&sent[1], Outbound::Text { content, .. } if content.starts_with("echo")));
        assert_eq!(d.composer().context().get("u1").await.last_message, "!recommend metal");
    }

    #[tokio::test]
    async fn mentioned_command_also_gets_a_conversation_turn() {
        let d = dispatcher(settings());
        let ch = channel(&["*"]);
        let mut msg = guild_msg("u1", "!vibe");
        msg.bot_mentioned = true;

        let handled = d.handle(&ch, msg).await.unwrap();
        assert_eq!(handled, Handled::CommandAndConversation("vibe".into()));
        assert_eq!(ch.sent().await.len(), 2);
        assert_eq!(d.composer().context().get("u1").await.message_count, 1);
    }

    #[tokio::test]
    async fn guild_command_is_only_a_command() {
        let d = dispatcher(settings());
        let ch = channel(&["*"]);

        let handled = d.handle(&ch, guild_msg("u1", "!recommend metal")).await.unwrap();
        assert_eq!(handled, Handled::Command("recommend".into()));
        assert_eq!(ch.sent().await.len(), 1);
        assert!(d.composer().context().is_empty().await);
    }

    #[tokio::test]
    async fn about_sends_a_card() {
        let d = dispatcher(settings());
        let ch = channel(&["*"]);
        d.handle(&ch, guild_msg("u1", "!about")).await.unwrap();
        assert!(matches!(&ch.sent().await[0], Outbound::Card { .. }));
    }

    #[tokio::test]
    async fn short_guild_chatter_is_ignored() {
        let d = dispatcher(settings());
        let ch = channel(&["*"]);
        let handled = d.handle(&ch, guild_msg("u1", "lol")).await.unwrap();
        assert_eq!(handled, Handled::Ignored);
    }

    #[tokio::test]
    async fn conversation_reply_is_truncated() {
        let d = dispatcher(DispatchSettings {
            max_message_length: 10,
            ..settings()
        });
        let ch = channel(&["*"]);
        let handled = d.handle(&ch, guild_msg("u1", "do you like metal?")).await.unwrap();
        assert_eq!(handled, Handled::Conversation);

        let Outbound::Text { content, .. } = &ch.sent().await[0] else {
            panic!("expected text");
        };
        assert_eq!(content.chars().count(), 10);
        assert!(content.starts_with("echo\n\nMeta"));
    }

    #[tokio::test]
    async fn serve_turns_a_panicking_turn_into_failure_reply() {
        let d = dispatcher(settings());
        let ch = Arc::new(channel(&["*"]));
        let rx = ch.start().await.unwrap();
        let loop_task = tokio::spawn(d.clone().serve(ch.clone(), rx));

        ch.inject_message(guild_msg("u1", "PANIC now please")).await.unwrap();
        ch.inject_message(guild_msg("u2", "hello there friend")).await.unwrap();
        ch.stop().await.unwrap();
        loop_task.await.unwrap();

        let sent = ch.sent().await;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().any(|o| matches!(
            o,
            Outbound::Text { content, .. } if content == TURN_FAILURE_REPLY
        )));
        assert!(sent.iter().any(|o| matches!(
            o,
            Outbound::Text { content, .. } if content == "echo"
        )));
    }

    #[tokio::test]
    async fn serve_reaps_finished_turns_while_running() {
        let d = dispatcher(settings());
        let ch = Arc::new(channel(&["*"]));
        let rx = ch.start().await.unwrap();
        let loop_task = tokio::spawn(d.clone().serve(ch.clone(), rx));

        for i in 0..50 {
            ch.inject_message(guild_msg("u1", &format!("message number {i}")))
                .await
                .unwrap();
            while ch.sent().await.len() <= i {
                tokio::task::yield_now().await;
            }
        }

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while d.in_flight() > 0 {
                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("finished turns were never reaped");
        assert!(!loop_task.is_finished());

        ch.stop().await.unwrap();
        loop_task.await.unwrap();
        assert_eq!(d.in_flight(), 0);
        assert_eq!(d.composer().context().get("u1").await.message_count, 50);
    }
}
