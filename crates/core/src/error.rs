//! Error types for the Raven domain.
//!
//! Each external collaborator has its own `thiserror` enum.

use thiserror::Error;

/// Failures talking to an LLM provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether this failure means the account is out of quota or throttled.
    ///
    /// OpenAI reports exhausted credits as a 429 with an
    /// `insufficient_quota` body, so the message is inspected as well.
    pub fn is_quota_or_rate_limit(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::ApiError {
                status_code,
                message,
            } => {
                *status_code == 429
                    || message.contains("insufficient_quota")
                    || message.contains("429")
            }
            _ => false,
        }
    }
}

/// Failures of a chat transport.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}
