//! CLI channel — interactive terminal-based chat.
//!
//! Reads from stdin, writes to stdout. Used for `raven chat`. Every line
//! counts as a direct message from a single local user.

use async_trait::async_trait;
use raven_core::channel::{Channel, ChannelId, ChannelMessage};
use raven_core::error::ChannelError;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    id: ChannelId,
    username: String,
}

impl CliChannel {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: ChannelId("cli".into()),
            username: username.into(),
        }
    }

    fn to_message(&self, line: String) -> ChannelMessage {
        ChannelMessage {
            channel_id: self.id.clone(),
            sender_id: "local_user".into(),
            sender_name: Some(self.username.clone()),
            content: line,
            chat_id: "cli_session".into(),
            is_direct_message: true,
            bot_mentioned: false,
            metadata: serde_json::Map::new(),
        }
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new("User")
    }
}

fn is_exit_command(line: &str) -> bool {
    matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q")
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(32);
        let template = CliChannel::new(self.username.clone());

        tokio::spawn(async move {
            let mut lines = BufReader::new(io::stdin()).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        if is_exit_command(&line) {
                            break;
                        }
                        if tx.send(Ok(template.to_message(line))).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, _chat_id: &str, content: &str) -> Result<(), ChannelError> {
        println!();
        for line in content.lines() {
            println!("  Raven > {line}");
        }
        println!();
        Ok(())
    }

    fn is_allowed(&self, _sender_id: &str) -> bool {
        true // CLI is always allowed (local user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_channel_properties() {
        let ch = CliChannel::default();
        assert_eq!(ch.name(), "cli");
        assert_eq!(ch.id().0, "cli");
        assert!(ch.is_allowed("anyone"));
    }

    #[test]
    fn lines_become_direct_messages() {
        let ch = CliChannel::new("Sam");
        let msg = ch.to_message("do you like metal?".into());
        assert!(msg.is_direct_message);
        assert_eq!(msg.display_name(), "Sam");
        assert_eq!(msg.sender_id, "local_user");
    }

    #[test]
    fn exit_commands_recognized() {
        assert!(is_exit_command("quit"));
        assert!(is_exit_command(":q"));
        assert!(!is_exit_command("quite the band"));
    }
}
