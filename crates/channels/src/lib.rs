//! Chat channel implementations for Raven.
//!
//! Each channel connects to a chat platform and relays messages to/from
//! the companion. Channels are trait-based and platform-agnostic.
//!
//! Available channels:
//! - **CLI** — Interactive terminal chat (stdin/stdout)
//! - **Discord** — Discord Bot API (stub with in-process injection)
//!
//! `routing` holds the transport-side rules deciding which inbound
//! messages reach the companion at all.

pub mod cli;
pub mod discord;
pub mod routing;

pub use cli::CliChannel;
pub use discord::{DiscordChannel, DiscordConfig, Outbound};
pub use routing::{parse_command, should_respond, truncate_reply};
