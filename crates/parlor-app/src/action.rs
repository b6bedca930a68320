//! Session side-effects.
//!
//! This module defines the [`SessionAction`] enum, the I/O requests produced
//! by the [`crate::Session`] state machine for the runtime to execute.

use parlor_core::{ChannelId, ChannelTag, NewRoom, OutgoingMessage, RoomId};

/// Identity of one history fetch.
///
/// A completion is applied only while its ticket is still the session's
/// pending ticket. Selecting a room (even the same one again) issues a new
/// ticket, so late results from an abandoned selection are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    /// Room whose history was requested.
    pub room_id: RoomId,
    /// Selection epoch at issue time.
    pub selection: u64,
}

/// Actions produced by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Re-render the view.
    Render,

    /// Load the room directory.
    FetchRooms,

    /// Load a room's message history.
    FetchHistory {
        /// Fetch identity, echoed back in the completion.
        ticket: FetchTicket,
    },

    /// Ask the directory to create a room.
    CreateRoom {
        /// Validated creation request.
        request: NewRoom,
    },

    /// Connect a live channel.
    OpenChannel {
        /// New channel id and the room it binds to.
        channel: ChannelTag,
    },

    /// Tear down a live channel.
    CloseChannel {
        /// Channel to close.
        channel: ChannelId,
    },

    /// Send a message over an open live channel.
    Transmit {
        /// Channel to send on.
        channel: ChannelTag,
        /// Message body.
        message: OutgoingMessage,
    },

    /// Persist a message through the durable write path.
    PersistMessage {
        /// Room the message belongs to.
        room_id: RoomId,
        /// Message body.
        message: OutgoingMessage,
    },
}
