//! Read-only view of the session for rendering.

use parlor_core::{ChannelState, Message, Room, RoomId};

/// Snapshot of everything a front end needs to draw.
///
/// Borrowed from the [`crate::Session`]; valid until the next mutation.
#[derive(Debug, Clone, Copy)]
pub struct SessionView<'a> {
    /// Known rooms in arrival order.
    pub rooms: &'a [Room],
    /// Selected room, if any.
    pub current_room: Option<&'a Room>,
    /// Log of the selected room, in display order.
    pub messages: &'a [Message],
    /// State of the bound live channel.
    pub channel: Option<ChannelState>,
    /// Room the live channel is bound to.
    pub channel_room: Option<&'a RoomId>,
    /// Display name used for sends.
    pub sender: &'a str,
    /// Whether the selected room's history is still loading.
    pub loading_history: bool,
}

impl SessionView<'_> {
    /// Whether sends currently go over the live channel.
    pub fn is_live(&self) -> bool {
        self.channel == Some(ChannelState::Open)
    }
}
