//! Session input events.
//!
//! This module defines [`SessionEvent`], the completions and notifications
//! that drive the [`crate::Session`] state machine.
//!
//! Events originate from two distinct sources:
//! - Request/response completions (directory, history, durable writes).
//! - Live channel notifications, each tagged with the channel that raised it.
//!
//! Failures carry a human-readable reason for logging only; the session never
//! surfaces them.

use parlor_core::{ChannelId, ChannelTag, Message, OutgoingMessage, Room, RoomId};

use crate::FetchTicket;

/// Events processed by the Session state machine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Periodic tick. Drives reconnect timers.
    Tick,

    /// Room directory listing arrived.
    RoomsLoaded {
        /// Rooms in directory order.
        rooms: Vec<Room>,
    },

    /// Room directory listing failed.
    RoomsFailed {
        /// Failure description.
        reason: String,
    },

    /// History arrived.
    HistoryLoaded {
        /// Ticket the fetch was issued with.
        ticket: FetchTicket,
        /// Messages in arrival order.
        messages: Vec<Message>,
    },

    /// History fetch failed.
    HistoryFailed {
        /// Ticket the fetch was issued with.
        ticket: FetchTicket,
        /// Failure description.
        reason: String,
    },

    /// Room creation succeeded.
    RoomCreated {
        /// Room as returned by the directory.
        room: Room,
    },

    /// Room creation failed.
    RoomCreateFailed {
        /// Failure description.
        reason: String,
    },

    /// Durable write accepted.
    MessagePersisted {
        /// Room the message was written to.
        room_id: RoomId,
    },

    /// Durable write failed.
    PersistFailed {
        /// Room the message was meant for.
        room_id: RoomId,
        /// Failure description.
        reason: String,
    },

    /// Live channel finished connecting.
    ChannelOpened {
        /// Channel that opened.
        channel: ChannelId,
    },

    /// Live channel delivered a text frame.
    ChannelFrame {
        /// Channel that delivered the frame.
        channel: ChannelId,
        /// Raw frame text.
        payload: String,
    },

    /// Live channel closed, on request or otherwise.
    ChannelClosed {
        /// Channel that closed.
        channel: ChannelId,
        /// Failure description if the close was not clean.
        reason: Option<String>,
    },

    /// A message could not be handed to a channel whose socket is gone.
    TransmitFailed {
        /// Channel the message was meant for.
        channel: ChannelTag,
        /// Message that was not sent.
        message: OutgoingMessage,
    },
}
