//! Event implementations that live outside a real chat host.
//!
//! [`ConsoleEvent`] prints replies to stdout for the CLI. [`RecordingEvent`]
//! keeps them in memory.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::Result;

use super::{Component, MessageEvent, MessageResult};

/// Writes every reply to stdout.
pub struct ConsoleEvent {
    message: String,
    sender: String,
}

impl ConsoleEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sender: "console".to_string(),
        }
    }
}

/// Render a reply as terminal text.
pub fn render(result: &MessageResult) -> String {
    match result {
        MessageResult::Plain(text) => text.clone(),
        MessageResult::Chain(chain) => chain
            .iter()
            .map(|component| match component {
                Component::Plain { text } => text.clone(),
                Component::Video { url } => format!("[video] {}", url),
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[async_trait]
impl MessageEvent for ConsoleEvent {
    fn message_str(&self) -> &str {
        &self.message
    }

    fn sender_name(&self) -> &str {
        &self.sender
    }

    async fn send(&self, result: MessageResult) -> Result<()> {
        println!("{}", render(&result));
        Ok(())
    }
}

/// Collects replies in order.
pub struct RecordingEvent {
    message: String,
    replies: Mutex<Vec<MessageResult>>,
}

impl RecordingEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            replies: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the replies sent so far.
    pub fn replies(&self) -> Vec<MessageResult> {
        self.replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MessageEvent for RecordingEvent {
    fn message_str(&self) -> &str {
        &self.message
    }

    async fn send(&self, result: MessageResult) -> Result<()> {
        self.replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(result);
        Ok(())
    }
}
