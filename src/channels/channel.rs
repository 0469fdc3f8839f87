//! Channel trait and the message types that flow through it.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use uuid::Uuid;

use crate::error::ChannelError;

/// Stream of user submissions produced by `Channel::start`.
pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// One line of user input.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: Uuid,
    pub channel: String,
    pub user_id: String,
    pub content: String,
    pub received_at: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(channel: &str, user_id: &str, content: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            content: content.to_string(),
            received_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// An assistant line sent back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub content: String,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Out-of-band progress shown alongside the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// A generation call is about to run.
    Thinking(String),
    /// Informational line, e.g. a session restart.
    Status(String),
    /// The plan PDF and its HTML copy were written.
    Saved { pdf: PathBuf, html: PathBuf },
    Error(String),
}

/// A place users talk to the planner through.
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Begin reading input. The stream ends when the user closes the channel.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    async fn send_status(
        &self,
        status: StatusUpdate,
        metadata: &serde_json::Value,
    ) -> Result<(), ChannelError>;

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
