//! `raven chat` — Interactive terminal session.
//!
//! Lines go through the same dispatcher as Discord messages, so prefix
//! commands such as `!vibe` work here too.

use std::sync::Arc;

use raven_channels::CliChannel;
use raven_config::Requirement;

pub async fn run(name: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(Requirement::ApiKey)?;
    let dispatcher = super::build_dispatcher(&config)?;

    println!();
    println!("  ╔══════════════════════════════════════╗");
    println!("  ║      🖤 Raven — Interactive Mode 🖤    ║");
    println!("  ╚══════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", config.default_model);
    println!("  Commands:  {}help", config.discord.command_prefix);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let channel = Arc::new(CliChannel::new(name));
    dispatcher
        .run(channel)
        .await
        .map_err(|e| format!("Channel error: {e}"))?;

    println!();
    println!("  Later, beautiful soul 🥀");
    println!();
    Ok(())
}
