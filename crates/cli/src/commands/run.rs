//! `raven run` — Serve the Discord channel.
//!
//! The Discord transport is an in-process stub: it does not connect to the
//! gateway, so nothing arrives until messages are injected into it.

use std::sync::Arc;

use raven_channels::{DiscordChannel, DiscordConfig};
use raven_config::{DiscordSettings, Requirement};
use raven_core::channel::Channel;
use tracing::info;

fn startup_banner(settings: &DiscordSettings) -> String {
    format!(
        "🖤 Raven — Starting Discord stub (in-process, no gateway connection)\n   \
         Prefix:   {}\n   \
         Presence: Listening to {}",
        settings.command_prefix, settings.presence
    )
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(Requirement::ApiKeyAndDiscord)?;
    let dispatcher = super::build_dispatcher(&config)?;

    println!("{}", startup_banner(&config.discord));

    let channel = Arc::new(DiscordChannel::new(DiscordConfig::from_settings(
        &config.discord,
    )));

    tokio::select! {
        result = dispatcher.run(channel.clone()) => {
            result.map_err(|e| format!("Discord channel error: {e}"))?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
            channel.stop().await?;
        }
    }

    Ok(())
}
