//! In-memory chat backend.
//!
//! Plays the room directory, the history store and the live broadcaster.
//! Ids are assigned from counters so runs are reproducible. Every stored
//! message remembers which room it was posted to, which is what the room
//! isolation invariant checks logs against.

use std::collections::HashMap;

use parlor_proto::{Message, MessageId, NewRoom, OutgoingMessage, Room, RoomId};

/// In-memory chat server state.
#[derive(Debug, Clone, Default)]
pub struct SimBackend {
    rooms: Vec<Room>,
    history: HashMap<RoomId, Vec<Message>>,
    origins: HashMap<MessageId, RoomId>,
    next_room: u64,
    next_message: u64,
    unavailable: bool,
}

impl SimBackend {
    /// Create a backend with no rooms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a room directly, bypassing the request path.
    pub fn seed_room(&mut self, name: &str) -> RoomId {
        self.insert_room(NewRoom { name: name.to_owned(), description: None }).id
    }

    /// Store a message directly, bypassing the request path.
    pub fn seed_message(&mut self, room_id: &RoomId, sender: &str, content: &str) -> Message {
        self.store(room_id, &OutgoingMessage::new(sender, content))
    }

    /// Make every request-path call fail until cleared.
    pub fn set_unavailable(&mut self, unavailable: bool) {
        self.unavailable = unavailable;
    }

    /// Whether request-path calls currently fail.
    pub fn is_unavailable(&self) -> bool {
        self.unavailable
    }

    /// `GET /api/rooms`.
    pub fn list_rooms(&self) -> Option<Vec<Room>> {
        (!self.unavailable).then(|| self.rooms.clone())
    }

    /// `POST /api/rooms`.
    pub fn create_room(&mut self, request: NewRoom) -> Option<Room> {
        (!self.unavailable).then(|| self.insert_room(request))
    }

    /// `GET /api/rooms/{id}/messages`. Unknown rooms fail.
    pub fn history(&self, room_id: &RoomId) -> Option<Vec<Message>> {
        if self.unavailable {
            return None;
        }
        self.history.get(room_id).cloned()
    }

    /// `POST /api/rooms/{id}/messages`. Stored but not broadcast.
    pub fn persist(&mut self, room_id: &RoomId, message: &OutgoingMessage) -> Option<Message> {
        if self.unavailable || !self.history.contains_key(room_id) {
            return None;
        }
        Some(self.store(room_id, message))
    }

    /// A frame received on a live channel: stored, then returned for
    /// broadcast to every connection on the room.
    pub fn post_live(&mut self, room_id: &RoomId, message: &OutgoingMessage) -> Message {
        self.store(room_id, message)
    }

    /// Room a stored message was posted to.
    pub fn origin(&self, message_id: &MessageId) -> Option<&RoomId> {
        self.origins.get(message_id)
    }

    /// All rooms in creation order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Stored messages of a room.
    pub fn messages(&self, room_id: &RoomId) -> &[Message] {
        self.history.get(room_id).map_or(&[], Vec::as_slice)
    }

    fn insert_room(&mut self, request: NewRoom) -> Room {
        self.next_room += 1;
        let room = Room {
            id: RoomId::new(self.next_room.to_string()),
            name: request.name,
            description: request.description,
        };
        self.history.insert(room.id.clone(), Vec::new());
        self.rooms.push(room.clone());
        room
    }

    fn store(&mut self, room_id: &RoomId, message: &OutgoingMessage) -> Message {
        self.next_message += 1;
        let stored = Message::new(
            self.next_message.to_string(),
            message.sender.clone(),
            message.content.clone(),
        );
        if let Some(id) = &stored.id {
            self.origins.insert(id.clone(), room_id.clone());
        }
        self.history.entry(room_id.clone()).or_default().push(stored.clone());
        stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_origins_tracked() {
        let mut backend = SimBackend::new();
        let general = backend.seed_room("general");
        let random = backend.seed_room("random");

        let first = backend.seed_message(&general, "a", "hi");
        let second = backend.seed_message(&random, "b", "yo");

        assert_eq!(general, RoomId::new("1"));
        assert_eq!(first.id, Some(MessageId::new("1")));
        assert_eq!(backend.origin(&MessageId::new("2")), Some(&random));
        assert_eq!(second.content, "yo");
    }

    #[test]
    fn unavailable_backend_fails_requests() {
        let mut backend = SimBackend::new();
        let room = backend.seed_room("general");
        backend.set_unavailable(true);

        assert!(backend.list_rooms().is_none());
        assert!(backend.history(&room).is_none());
        assert!(backend.persist(&room, &OutgoingMessage::new("a", "x")).is_none());
    }

    #[test]
    fn history_of_unknown_room_fails() {
        let backend = SimBackend::new();
        assert!(backend.history(&RoomId::new("nope")).is_none());
    }
}
