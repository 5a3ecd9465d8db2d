//! Host framework contract
//!
//! The chat-bot host owns command routing, message rendering and the plugin
//! lifecycle. This module is the slice of that contract a plugin calls into:
//!
//! - [`PluginMetadata`]: registration info (name, author, description,
//!   version, repo URL)
//! - [`Component`] / [`MessageResult`]: reply building blocks
//! - [`MessageEvent`]: the triggering message plus reply emission
//! - [`Star`]: lifecycle and command handling implemented by plugins
//!
//! [`console`] provides stdout and in-memory event implementations.

pub mod console;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Registration info a plugin hands to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginMetadata {
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: String,
    pub repo: String,
}

/// A top-level command a plugin answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

impl CommandSpec {
    /// Returns `true` if `word` is the command name or one of its aliases.
    pub fn matches(&self, word: &str) -> bool {
        self.name == word || self.aliases.contains(&word)
    }
}

// ---------------------------------------------------------------------------
// Message components
// ---------------------------------------------------------------------------

/// One element of a composed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    Plain { text: String },
    Video { url: String },
}

impl Component {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn video_from_url(url: impl Into<String>) -> Self {
        Self::Video { url: url.into() }
    }
}

/// A reply emitted back to the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "content", rename_all = "snake_case")]
pub enum MessageResult {
    /// Plain text.
    Plain(String),
    /// An ordered chain of components rendered as one message.
    Chain(Vec<Component>),
}

impl MessageResult {
    /// Text of a plain reply, `None` for chains.
    pub fn as_plain(&self) -> Option<&str> {
        match self {
            Self::Plain(text) => Some(text),
            Self::Chain(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The message that triggered a command, and the way to answer it.
#[async_trait]
pub trait MessageEvent: Send + Sync {
    /// Raw text of the triggering message.
    fn message_str(&self) -> &str;

    /// Display name of the sender, if the host knows it.
    fn sender_name(&self) -> &str {
        ""
    }

    fn plain_result(&self, text: &str) -> MessageResult {
        MessageResult::Plain(text.to_string())
    }

    fn chain_result(&self, chain: Vec<Component>) -> MessageResult {
        MessageResult::Chain(chain)
    }

    /// Deliver a reply to the conversation.
    async fn send(&self, result: MessageResult) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Plugin lifecycle
// ---------------------------------------------------------------------------

/// A plugin as seen by the host.
///
/// Construction happens in the plugin's own constructor; the host calls
/// [`Star::terminate`] exactly once on teardown, though implementations
/// must tolerate repeated calls.
#[async_trait]
pub trait Star: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    /// Commands this plugin registers.
    fn commands(&self) -> Vec<CommandSpec>;

    /// Handle `command` (canonical name) with the remaining `args`.
    async fn handle(&self, command: &str, args: &str, event: &dyn MessageEvent) -> Result<()>;

    async fn terminate(&self);
}

/// Split a message like `/video 美女` into the matched canonical command
/// name and its trimmed arguments. Returns `None` when no command matches.
pub fn route<'a>(commands: &[CommandSpec], text: &'a str) -> Option<(&'static str, &'a str)> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    let (word, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (trimmed, ""),
    };

    commands
        .iter()
        .find(|spec| spec.matches(word))
        .map(|spec| (spec.name, rest))
}

/// Route the event's message to `star` and run the matching handler.
///
/// Returns `Ok(false)` when the message names no registered command.
pub async fn dispatch(star: &dyn Star, event: &dyn MessageEvent) -> Result<bool> {
    let commands = star.commands();
    match route(&commands, event.message_str()) {
        Some((command, args)) => {
            star.handle(command, args, event).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMANDS: &[CommandSpec] = &[CommandSpec {
        name: "video",
        aliases: &["小视频", "短视频"],
    }];

    #[test]
    fn test_route_with_prefix_and_args() {
        assert_eq!(route(COMMANDS, "/video 美女"), Some(("video", "美女")));
        assert_eq!(route(COMMANDS, "video"), Some(("video", "")));
        assert_eq!(route(COMMANDS, "  video   状态  "), Some(("video", "状态")));
    }

    #[test]
    fn test_route_aliases() {
        assert_eq!(route(COMMANDS, "/短视频 随机"), Some(("video", "随机")));
        assert_eq!(route(COMMANDS, "小视频"), Some(("video", "")));
    }

    #[test]
    fn test_route_no_match() {
        assert_eq!(route(COMMANDS, "/videos"), None);
        assert_eq!(route(COMMANDS, "hello video"), None);
        assert_eq!(route(COMMANDS, ""), None);
    }

    #[test]
    fn test_component_serialization() {
        let chain = MessageResult::Chain(vec![
            Component::video_from_url("https://x/a.mp4"),
            Component::plain("ok"),
        ]);
        let json = serde_json::to_value(&chain).unwrap();
        assert_eq!(json["kind"], "chain");
        assert_eq!(json["content"][0]["type"], "video");
        assert_eq!(json["content"][1]["text"], "ok");
    }
}
