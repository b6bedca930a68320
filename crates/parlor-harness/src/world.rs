//! Simulated network between one session and the backend.
//!
//! Requests from the session are served by the [`SimBackend`] immediately,
//! but their completions are queued rather than delivered. Tests decide when
//! (and in which order) queued events reach the session, which is how races
//! such as a late history response or a frame from a closing channel are
//! produced on demand.
//!
//! Server-side connections are tracked separately from the session's view:
//! a connection exists from `open_channel` until `close_channel` or
//! [`World::drop_channel`].

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Arc, Mutex, PoisonError},
};

use parlor_app::{FetchTicket, SessionAction, SessionEvent};
use parlor_core::{ChannelId, ChannelTag};
use parlor_proto::{Message, NewRoom, OutgoingMessage, RoomId};
use tracing::trace;

use crate::SimBackend;

/// A [`World`] shared between a [`crate::SimDriver`] and the test.
pub type SharedWorld = Arc<Mutex<World>>;

/// Backend, live connections and undelivered events.
#[derive(Debug, Default)]
pub struct World {
    backend: SimBackend,
    connections: BTreeMap<ChannelId, RoomId>,
    pending: VecDeque<SessionEvent>,
    transmissions: Vec<(ChannelTag, OutgoingMessage)>,
    durable_writes: Vec<(RoomId, OutgoingMessage)>,
}

impl World {
    /// Create a world around a backend.
    pub fn new(backend: SimBackend) -> Self {
        Self { backend, ..Self::default() }
    }

    /// Wrap in a shareable handle.
    pub fn into_shared(self) -> SharedWorld {
        Arc::new(Mutex::new(self))
    }

    /// Lock a shared world, ignoring poisoning from a panicked test thread.
    pub fn lock(world: &SharedWorld) -> std::sync::MutexGuard<'_, Self> {
        world.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve every action the session produced.
    pub fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            self.execute_one(action);
        }
    }

    /// Serve one action. `Render` is ignored.
    pub fn execute_one(&mut self, action: SessionAction) {
        match action {
            SessionAction::Render => {},
            SessionAction::FetchRooms => self.fetch_rooms(),
            SessionAction::FetchHistory { ticket } => self.fetch_history(ticket),
            SessionAction::CreateRoom { request } => self.create_room(request),
            SessionAction::OpenChannel { channel } => self.open_channel(channel),
            SessionAction::CloseChannel { channel } => self.close_channel(channel),
            SessionAction::Transmit { channel, message } => self.transmit(channel, message),
            SessionAction::PersistMessage { room_id, message } => {
                self.persist_message(room_id, message);
            },
        }
    }

    /// Queue the directory listing (or its failure).
    pub fn fetch_rooms(&mut self) {
        let event = match self.backend.list_rooms() {
            Some(rooms) => SessionEvent::RoomsLoaded { rooms },
            None => SessionEvent::RoomsFailed { reason: "directory unavailable".to_owned() },
        };
        self.pending.push_back(event);
    }

    /// Queue a room's history (or its failure).
    pub fn fetch_history(&mut self, ticket: FetchTicket) {
        let event = match self.backend.history(&ticket.room_id) {
            Some(messages) => SessionEvent::HistoryLoaded { ticket, messages },
            None => {
                SessionEvent::HistoryFailed { ticket, reason: "history unavailable".to_owned() }
            },
        };
        self.pending.push_back(event);
    }

    /// Create a room and queue the result.
    pub fn create_room(&mut self, request: NewRoom) {
        let event = match self.backend.create_room(request) {
            Some(room) => SessionEvent::RoomCreated { room },
            None => SessionEvent::RoomCreateFailed { reason: "directory unavailable".to_owned() },
        };
        self.pending.push_back(event);
    }

    /// Store a message through the durable path and queue the result.
    pub fn persist_message(&mut self, room_id: RoomId, message: OutgoingMessage) {
        let event = match self.backend.persist(&room_id, &message) {
            Some(_) => SessionEvent::MessagePersisted { room_id: room_id.clone() },
            None => SessionEvent::PersistFailed {
                room_id: room_id.clone(),
                reason: "write rejected".to_owned(),
            },
        };
        self.durable_writes.push((room_id, message));
        self.pending.push_back(event);
    }

    /// Accept a connection and queue its open notification.
    pub fn open_channel(&mut self, channel: ChannelTag) {
        trace!(channel = %channel.id, room = %channel.room_id, "connection accepted");
        self.connections.insert(channel.id, channel.room_id);
        self.pending.push_back(SessionEvent::ChannelOpened { channel: channel.id });
    }

    /// Tear down a connection and queue its close notification.
    pub fn close_channel(&mut self, channel: ChannelId) {
        if self.connections.remove(&channel).is_some() {
            self.pending.push_back(SessionEvent::ChannelClosed { channel, reason: None });
        }
    }

    /// Receive a frame from the session and broadcast it to the room.
    ///
    /// Frames for a connection the server no longer has are reported back
    /// as [`SessionEvent::TransmitFailed`].
    pub fn transmit(&mut self, channel: ChannelTag, message: OutgoingMessage) {
        self.transmissions.push((channel.clone(), message.clone()));
        if !self.connections.contains_key(&channel.id) {
            self.pending.push_back(SessionEvent::TransmitFailed { channel, message });
            return;
        }
        let stored = self.backend.post_live(&channel.room_id, &message);
        self.broadcast(&channel.room_id, &stored);
    }

    /// Another participant posts to a room over their own live channel.
    pub fn remote_post(&mut self, room_id: &RoomId, sender: &str, content: &str) -> Message {
        let stored = self.backend.post_live(room_id, &OutgoingMessage::new(sender, content));
        self.broadcast(room_id, &stored);
        stored
    }

    /// Queue a raw frame on a connection, bypassing the backend.
    pub fn inject_frame(&mut self, channel: ChannelId, payload: &str) {
        self.pending.push_back(SessionEvent::ChannelFrame { channel, payload: payload.to_owned() });
    }

    /// Server drops a connection without being asked to.
    pub fn drop_channel(&mut self, channel: ChannelId) {
        if self.connections.remove(&channel).is_some() {
            let reason = Some("connection reset".to_owned());
            self.pending.push_back(SessionEvent::ChannelClosed { channel, reason });
        }
    }

    /// Drop every live connection.
    pub fn drop_all_channels(&mut self) {
        let channels: Vec<_> = self.connections.keys().copied().collect();
        for channel in channels {
            self.drop_channel(channel);
        }
    }

    /// Take the oldest queued event.
    pub fn deliver_next(&mut self) -> Option<SessionEvent> {
        self.pending.pop_front()
    }

    /// Take a queued event out of order. `index` wraps around the queue.
    pub fn deliver_at(&mut self, index: usize) -> Option<SessionEvent> {
        if self.pending.is_empty() {
            return None;
        }
        let index = index % self.pending.len();
        self.pending.remove(index)
    }

    /// Number of queued events.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Queued events in delivery order.
    pub fn pending(&self) -> std::collections::vec_deque::Iter<'_, SessionEvent> {
        self.pending.iter()
    }

    /// Server-side connections and their rooms.
    pub fn connections(&self) -> &BTreeMap<ChannelId, RoomId> {
        &self.connections
    }

    /// Every frame the session handed to a channel.
    pub fn transmissions(&self) -> &[(ChannelTag, OutgoingMessage)] {
        &self.transmissions
    }

    /// Every durable write the session requested.
    pub fn durable_writes(&self) -> &[(RoomId, OutgoingMessage)] {
        &self.durable_writes
    }

    /// Backend state.
    pub fn backend(&self) -> &SimBackend {
        &self.backend
    }

    /// Mutable backend state.
    pub fn backend_mut(&mut self) -> &mut SimBackend {
        &mut self.backend
    }

    fn broadcast(&mut self, room_id: &RoomId, message: &Message) {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(%err, "unencodable message not broadcast");
                return;
            },
        };
        for (channel, bound) in &self.connections {
            if bound == room_id {
                self.pending.push_back(SessionEvent::ChannelFrame {
                    channel: *channel,
                    payload: payload.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: u64, room_id: &RoomId) -> ChannelTag {
        ChannelTag { id: ChannelId::new(id), room_id: room_id.clone() }
    }

    #[test]
    fn broadcast_reaches_only_connections_on_room() {
        let mut backend = SimBackend::new();
        let general = backend.seed_room("general");
        let random = backend.seed_room("random");
        let mut world = World::new(backend);
        world.open_channel(tag(1, &general));
        world.open_channel(tag(2, &random));
        world.pending.clear();

        world.remote_post(&general, "a", "hi");

        assert_eq!(world.pending_len(), 1);
        assert!(matches!(
            world.deliver_next(),
            Some(SessionEvent::ChannelFrame { channel, .. }) if channel == ChannelId::new(1)
        ));
    }

    #[test]
    fn transmit_on_closed_connection_bounces() {
        let mut backend = SimBackend::new();
        let general = backend.seed_room("general");
        let mut world = World::new(backend);

        world.transmit(tag(5, &general), OutgoingMessage::new("a", "x"));

        assert!(matches!(world.deliver_next(), Some(SessionEvent::TransmitFailed { .. })));
        assert!(world.backend().messages(&general).is_empty());
    }

    #[test]
    fn deliver_at_wraps() {
        let mut world = World::new(SimBackend::new());
        world.fetch_rooms();
        world.inject_frame(ChannelId::new(1), "x");

        assert!(matches!(world.deliver_at(3), Some(SessionEvent::ChannelFrame { .. })));
        assert!(matches!(world.deliver_at(0), Some(SessionEvent::RoomsLoaded { .. })));
        assert!(world.deliver_at(0).is_none());
    }
}
