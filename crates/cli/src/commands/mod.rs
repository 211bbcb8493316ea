pub mod ask;
pub mod chat;
pub mod init;
pub mod knowledge;
pub mod run;
pub mod status;

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use raven_companion::{
    CommandSet, DispatchSettings, Dispatcher, GenerationSettings, KnowledgeBase, LookupEngine,
    ProviderBackend, ResponseComposer,
};
use raven_config::{AppConfig, ConfigError, Requirement};
use tracing::info;

/// Load config and fail with setup instructions when credentials are missing.
pub(crate) fn load_config(requirement: Requirement) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Err(ConfigError::MissingCredential(missing)) = config.require_credentials(requirement) {
        eprintln!();
        eprintln!("  ERROR: Missing credentials: {missing}");
        eprintln!();
        eprintln!("  Set these environment variables:");
        eprintln!("    OPENAI_API_KEY = 'sk-...'     (or RAVEN_API_KEY)");
        if requirement == Requirement::ApiKeyAndDiscord {
            eprintln!("    DISCORD_TOKEN  = '...'        (Discord Developer Portal → Bot → Token)");
        }
        eprintln!();
        eprintln!("  Or add them to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err(format!("Missing credentials: {missing}").into());
    }

    Ok(config)
}

/// Wire provider, companion and commands together from config.
pub(crate) fn build_dispatcher(config: &AppConfig) -> Result<Arc<Dispatcher>, Box<dyn std::error::Error>> {
    let router = raven_providers::router::build_from_config(config);
    let provider = router.default().ok_or("No default provider configured")?;

    let backend = Arc::new(ProviderBackend::new(provider, &config.default_model));
    info!(provider = backend.provider_name(), model = backend.model(), "Generation backend ready");
    let lookup = Arc::new(LookupEngine::from_entropy(Arc::new(KnowledgeBase::new())));
    let composer = Arc::new(ResponseComposer::new(
        lookup.clone(),
        backend,
        GenerationSettings::from_config(config),
    ));
    let commands = Arc::new(CommandSet::new(
        lookup,
        StdRng::from_os_rng(),
        &config.discord.command_prefix,
    ));

    Ok(Arc::new(Dispatcher::new(
        composer,
        commands,
        DispatchSettings::from_settings(&config.discord),
    )))
}
