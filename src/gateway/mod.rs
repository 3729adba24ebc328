//! The seam between the bot's core and the chat platform.
//!
//! The poll engine only talks to [`Gateway`] and the liveness supervisor only
//! talks to [`Session`]. The serenity-backed implementation lives in
//! [`discord`]; tests use the in-memory doubles in `fake`.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

pub mod discord;
#[cfg(test)]
pub mod fake;

/// Identifies a posted message, and therefore a poll's anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageHandle {
    pub channel: u64,
    pub message: u64,
}

impl std::fmt::Display for MessageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.channel, self.message)
    }
}

/// An embed-shaped message. Colours are plain RGB.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Announcement {
    pub title: String,
    pub description: String,
    pub colour: u32,
    pub image: Option<String>,
    pub footer: Option<String>,
}

impl Announcement {
    pub fn new(title: impl Into<String>, description: impl Into<String>, colour: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            colour,
            ..Default::default()
        }
    }
}

/// Gateway connection status as reported by the platform client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ready,
    Connecting,
    Disconnected,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("message not found")]
    NotFound,
    #[error("gateway did not become ready in time")]
    Timeout,
    #[error("gateway request failed: {0}")]
    Request(String),
}

#[async_trait]
pub trait Gateway: Send + Sync {
    async fn post_message(
        &self,
        channel: u64,
        announcement: &Announcement,
    ) -> Result<MessageHandle, GatewayError>;

    async fn add_reaction(&self, anchor: MessageHandle, symbol: &str) -> Result<(), GatewayError>;

    /// Raw per-symbol reaction counts, including the bot's own reaction.
    async fn reaction_counts(
        &self,
        anchor: MessageHandle,
    ) -> Result<HashMap<String, u64>, GatewayError>;
}

#[async_trait]
pub trait Session: Send + Sync {
    async fn connection_status(&self) -> ConnectionStatus;

    /// Tear the current gateway session down and establish a new one.
    async fn reconnect(&self) -> Result<(), GatewayError>;
}
