//! Chat message payloads.
//!
//! Inbound live frames and history entries share one shape, [`Message`].
//! Outbound frames (live channel) and durable-write bodies (HTTP) share
//! another, [`OutgoingMessage`].

use serde::{Deserialize, Serialize};

use crate::{MessageId, Result, errors::ProtocolError};

/// A delivered chat message.
///
/// Unknown fields are ignored so the backend can attach metadata (room ids,
/// timestamps) without breaking older clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Backend-assigned id. `None` for unacknowledged messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    /// Display name of the author.
    pub sender: String,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Create a message with a backend id.
    pub fn new(
        id: impl Into<MessageId>,
        sender: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self { id: Some(id.into()), sender: sender.into(), content: content.into() }
    }

    /// Create a message without an id.
    pub fn anonymous(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: None, sender: sender.into(), content: content.into() }
    }

    /// Decode a live-channel text frame.
    pub fn from_frame(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Decode a live-channel binary frame.
    ///
    /// The backend only ever sends JSON text, but some proxies re-frame text
    /// as binary. Non-UTF-8 payloads are rejected.
    pub fn from_frame_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| ProtocolError::NotUtf8)?;
        Self::from_frame(text)
    }
}

/// Body of an outgoing message, on either transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Display name of the author.
    pub sender: String,
    /// Message text, already trimmed.
    pub content: String,
}

impl OutgoingMessage {
    /// Create an outgoing message.
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self { sender: sender.into(), content: content.into() }
    }

    /// Encode as a live-channel text frame.
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
