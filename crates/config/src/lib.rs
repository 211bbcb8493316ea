//! Configuration loading, validation, and management for Raven.
//!
//! Loads configuration from `~/.raven/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.raven/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the generation backend (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature for persona replies
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per generated reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Upper bound on a single backend call, in seconds
    #[serde(default = "default_backend_timeout_secs")]
    pub backend_timeout_secs: u64,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Discord transport settings
    #[serde(default)]
    pub discord: DiscordSettings,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.8
}
fn default_max_tokens() -> u32 {
    300
}
fn default_backend_timeout_secs() -> u64 {
    60
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("backend_timeout_secs", &self.backend_timeout_secs)
            .field("providers", &self.providers)
            .field("discord", &self.discord)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DiscordSettings {
    /// Bot token from the Discord Developer Portal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// The bot's own user id; its own messages are ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user_id: Option<String>,

    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,

    /// Allowlist of sender IDs. Empty = deny all. ["*"] = allow all.
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,

    /// Platform limit on a single outbound message, in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// "Listening to ..." presence text
    #[serde(default = "default_presence")]
    pub presence: String,
}

fn default_command_prefix() -> String {
    "!".into()
}
fn default_allowed_users() -> Vec<String> {
    vec!["*".into()]
}
fn default_max_message_length() -> usize {
    2000
}
fn default_presence() -> String {
    "My Chemical Romance 🖤".into()
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            bot_user_id: None,
            command_prefix: default_command_prefix(),
            allowed_users: default_allowed_users(),
            max_message_length: default_max_message_length(),
            presence: default_presence(),
        }
    }
}

impl std::fmt::Debug for DiscordSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSettings")
            .field("bot_token", &redact(&self.bot_token))
            .field("bot_user_id", &self.bot_user_id)
            .field("command_prefix", &self.command_prefix)
            .field("allowed_users", &self.allowed_users)
            .field("max_message_length", &self.max_message_length)
            .field("presence", &self.presence)
            .finish()
    }
}

/// Which credentials a command needs before it may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Only the generation backend key
    ApiKey,
    /// Backend key and Discord token
    ApiKeyAndDiscord,
}

impl AppConfig {
    /// Load configuration from the default path (~/.raven/config.toml).
    ///
    /// Environment variables override file values:
    /// - `RAVEN_API_KEY`, then `OPENAI_API_KEY` (only when no key is configured)
    /// - `RAVEN_PROVIDER`, `RAVEN_MODEL`
    /// - `DISCORD_TOKEN`, `DISCORD_BOT_USER_ID`, `COMMAND_PREFIX`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("RAVEN_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(provider) = lookup("RAVEN_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("RAVEN_MODEL") {
            self.default_model = model;
        }
        if let Some(token) = lookup("DISCORD_TOKEN") {
            self.discord.bot_token = Some(token);
        }
        if let Some(id) = lookup("DISCORD_BOT_USER_ID") {
            self.discord.bot_user_id = Some(id);
        }
        if let Some(prefix) = lookup("COMMAND_PREFIX") {
            self.discord.command_prefix = prefix;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".raven")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }
        if self.backend_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend_timeout_secs must be > 0".into(),
            ));
        }
        if self.discord.command_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "discord.command_prefix must not be empty".into(),
            ));
        }
        if self.discord.max_message_length == 0 {
            return Err(ConfigError::ValidationError(
                "discord.max_message_length must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Fail fast when a credential the command needs is missing.
    pub fn require_credentials(&self, requirement: Requirement) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.api_key.as_deref().is_none_or(str::is_empty) {
            missing.push("OPENAI_API_KEY");
        }
        if requirement == Requirement::ApiKeyAndDiscord
            && self.discord.bot_token.as_deref().is_none_or(str::is_empty)
        {
            missing.push("DISCORD_TOKEN");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingCredential(missing.join(", ")))
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Write the default config to `path` unless a file already exists there.
    /// Returns whether a file was written.
    pub fn write_default(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        let write_error = |e: std::io::Error| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_error)?;
        }
        std::fs::write(path, Self::default_toml()).map_err(write_error)?;
        Ok(true)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            backend_timeout_secs: default_backend_timeout_secs(),
            providers: HashMap::new(),
            discord: DiscordSettings::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to write config file at {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Missing required credentials: {0}")]
    MissingCredential(String),
}
