//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture the observable state of the system at a point in time.
//! Invariants operate on snapshots rather than live state to ensure
//! consistent, atomic checks.

use parlor_app::SessionView;
use parlor_core::ChannelState;
use parlor_proto::{Message, RoomId};

use crate::World;

/// Snapshot of one session and the server side of its connections.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Selected room. `None` before the first selection.
    pub current_room: Option<RoomId>,
    /// Registry ids in arrival order.
    pub rooms: Vec<RoomId>,
    /// Logged messages, each with the room the backend stored it under
    /// (`None` if the backend never saw it).
    pub messages: Vec<(Message, Option<RoomId>)>,
    /// Room the session's channel is bound to.
    pub channel_room: Option<RoomId>,
    /// State of the session's channel.
    pub channel_state: Option<ChannelState>,
    /// Rooms of the connections the server currently holds.
    pub connections: Vec<RoomId>,
}

impl SessionSnapshot {
    /// Capture a session view together with the world it talks to.
    pub fn capture(view: &SessionView<'_>, world: &World) -> Self {
        let backend = world.backend();
        let messages = view
            .messages
            .iter()
            .map(|message| {
                let origin = message.id.as_ref().and_then(|id| backend.origin(id)).cloned();
                (message.clone(), origin)
            })
            .collect();

        Self {
            current_room: view.current_room.map(|room| room.id.clone()),
            rooms: view.rooms.iter().map(|room| room.id.clone()).collect(),
            messages,
            channel_room: view.channel_room.cloned(),
            channel_state: view.channel,
            connections: world.connections().values().cloned().collect(),
        }
    }

    /// Set the selected room.
    #[must_use]
    pub fn with_current_room(mut self, room_id: Option<RoomId>) -> Self {
        self.current_room = room_id;
        self
    }

    /// Add registry entries.
    #[must_use]
    pub fn with_rooms(mut self, rooms: impl IntoIterator<Item = RoomId>) -> Self {
        self.rooms.extend(rooms);
        self
    }

    /// Append a logged message with its origin.
    #[must_use]
    pub fn with_message(mut self, message: Message, origin: Option<RoomId>) -> Self {
        self.messages.push((message, origin));
        self
    }

    /// Add a server-side connection.
    #[must_use]
    pub fn with_connection(mut self, room_id: RoomId) -> Self {
        self.connections.push(room_id);
        self
    }

    /// Set the session's channel.
    #[must_use]
    pub fn with_channel(mut self, room_id: RoomId, state: ChannelState) -> Self {
        self.channel_room = Some(room_id);
        self.channel_state = Some(state);
        self
    }
}
