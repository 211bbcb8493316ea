//! Inbound routing rules owned by the transport layer.
//!
//! The companion itself never sees a message unless these rules let it
//! through. Guild chatter that looks like a command is never conversation;
//! a DM or mention always is, prefixed or not. Leading whitespace is ignored
//! when looking for the prefix.

use raven_core::channel::ChannelMessage;

/// Whether an inbound message should start a conversation turn.
///
/// Direct messages and mentions always qualify. Otherwise the text must not
/// look like a command and must be longer than three characters.
pub fn should_respond(msg: &ChannelMessage, command_prefix: &str) -> bool {
    let looks_like_command = msg.content.trim_start().starts_with(command_prefix);
    msg.is_direct_message
        || msg.bot_mentioned
        || (!looks_like_command && msg.content.chars().count() > 3)
}

/// Split `!name rest of line` into a lowercased command name and its
/// trimmed arguments. Returns `None` for text without the prefix or with an
/// empty command name.
pub fn parse_command(text: &str, command_prefix: &str) -> Option<(String, Option<String>)> {
    let body = text.trim_start().strip_prefix(command_prefix)?;
    let mut parts = body.trim().splitn(2, char::is_whitespace);
    let name = parts.next().filter(|n| !n.is_empty())?.to_lowercase();
    let args = parts
        .next()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from);
    Some((name, args))
}

/// Cut a reply down to the platform's per-message limit on a char boundary.
pub fn truncate_reply(reply: &str, max_chars: usize) -> String {
    match reply.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => reply[..byte_idx].to_string(),
        None => reply.to_string(),
    }
}
