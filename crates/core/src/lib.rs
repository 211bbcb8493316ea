//! # Raven Core
//!
//! Domain types, traits, and error definitions for the Raven chat companion.
//! This crate has **no framework dependencies**: it defines the model that
//! the provider, channel and companion crates implement against.
//!
//! Every external collaborator (LLM backend, chat platform) is a trait here,
//! so the conversation pipeline can be exercised with in-process fakes.

pub mod error;
pub mod message;
pub mod provider;
pub mod channel;

// Re-export key types at crate root for ergonomics
pub use error::{ChannelError, ProviderError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use channel::{Card, CardField, Channel, ChannelId, ChannelMessage};
