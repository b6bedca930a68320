//! User intents and the combined input stream.

use parlor_core::RoomId;

use crate::SessionEvent;

/// A request from the user.
///
/// Decouples the session from any particular front end; the console client
/// parses lines into intents and the simulation harness generates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Select a room by id.
    SelectRoom(RoomId),
    /// Select a room by `#index`, id or name.
    JoinRoom(String),
    /// Create a room and select it.
    CreateRoom {
        /// Requested name (trimmed before sending).
        name: String,
        /// Optional description.
        description: Option<String>,
    },
    /// Send a message to the selected room.
    SendMessage(String),
    /// Change the display name.
    SetSender(String),
    /// End the session.
    Quit,
}

/// Anything the runtime can receive from its driver.
#[derive(Debug, Clone)]
pub enum Input {
    /// User request.
    Intent(Intent),
    /// I/O completion or channel notification.
    Session(SessionEvent),
}

impl From<Intent> for Input {
    fn from(intent: Intent) -> Self {
        Self::Intent(intent)
    }
}

impl From<SessionEvent> for Input {
    fn from(event: SessionEvent) -> Self {
        Self::Session(event)
    }
}
