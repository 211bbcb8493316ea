//! `raven status` — Show configuration status.

use raven_config::{AppConfig, Requirement};
use raven_core::error::ProviderError;

fn set_or_missing(value: bool) -> &'static str {
    if value { "set" } else { "missing" }
}

fn reachability(result: &Result<bool, ProviderError>) -> String {
    match result {
        Ok(true) => "✅ Provider reachable".into(),
        Ok(false) => "⚠️  Provider rejected the request (check the API key)".into(),
        Err(e) => format!("⚠️  Provider unreachable: {e}"),
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("🖤 Raven Status");
    println!("==============");
    println!("  Config dir:    {}", AppConfig::config_dir().display());
    println!("  Provider:      {}", config.default_provider);
    println!("  Model:         {}", config.default_model);
    println!("  Temperature:   {}", config.temperature);
    println!("  Max tokens:    {}", config.max_tokens);
    println!("  Timeout:       {}s", config.backend_timeout_secs);
    println!("  API key:       {}", set_or_missing(config.api_key.is_some()));
    println!("  Discord token: {}", set_or_missing(config.discord.bot_token.is_some()));
    println!("  Prefix:        {}", config.discord.command_prefix);
    println!("  Allowed users: {}", config.discord.allowed_users.join(", "));
    println!("  Max length:    {}", config.discord.max_message_length);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file, using defaults and environment");
    }

    match config.require_credentials(Requirement::ApiKeyAndDiscord) {
        Ok(()) => println!("  ✅ Ready for `raven run`"),
        Err(e) => println!("  ⚠️  {e}"),
    }

    if config.require_credentials(Requirement::ApiKey).is_ok() {
        let router = raven_providers::router::build_from_config(&config);
        if let Some(provider) = router.default() {
            println!("  {}", reachability(&provider.health_check().await));
        }
    }

    Ok(())
}
