//! Generation backend abstraction.
//!
//! The composer only needs "system prompt + user prompt in, text out". Any
//! [`Provider`] can serve that through [`ProviderBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use raven_core::error::ProviderError;
use raven_core::message::Message;
use raven_core::provider::{Provider, ProviderRequest};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    RateLimited,
    Other,
}

#[derive(Debug, Clone, Error)]
#[error("generation failed ({kind:?}): {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::RateLimited,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: BackendErrorKind::Other,
            message: message.into(),
        }
    }
}

impl From<ProviderError> for BackendError {
    fn from(err: ProviderError) -> Self {
        if err.is_quota_or_rate_limit() {
            Self::rate_limited(err.to_string())
        } else {
            Self::other(err.to_string())
        }
    }
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, BackendError>;
}

/// Runs generation through a chat-completion provider.
pub struct ProviderBackend {
    provider: Arc<dyn Provider>,
    model: String,
}

impl ProviderBackend {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerationBackend for ProviderBackend {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, BackendError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system_prompt), Message::user(user_prompt)],
            temperature,
            max_tokens: Some(max_tokens),
        };
        debug!(provider = %self.provider.name(), model = %self.model, "Requesting completion");
        let response = self.provider.complete(request).await?;
        Ok(response.message.content.trim().to_string())
    }
}
