//! Room registry.
//!
//! Holds the rooms the client knows about and which one is selected. The
//! registry is append-only: rooms arrive from the startup directory listing
//! or from a successful creation, and are never renamed or removed. Ids are
//! unique; a second record with a known id is ignored.

use parlor_proto::{Room, RoomId};

use crate::SyncError;

/// Known rooms plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct RoomRegistry {
    rooms: Vec<Room>,
    selected: Option<RoomId>,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a directory listing into the registry.
    ///
    /// Rooms whose id is already known are skipped, including duplicates
    /// within the listing itself. Listing order is preserved.
    ///
    /// Returns the number of rooms added.
    pub fn merge(&mut self, rooms: impl IntoIterator<Item = Room>) -> usize {
        let mut added = 0;
        for room in rooms {
            if self.add(room) {
                added += 1;
            }
        }
        added
    }

    /// Append a room.
    ///
    /// Returns `false` if a room with the same id already exists, in which
    /// case the existing record is kept.
    pub fn add(&mut self, room: Room) -> bool {
        if self.contains(&room.id) {
            return false;
        }
        self.rooms.push(room);
        true
    }

    /// Mark a known room as selected.
    ///
    /// Selecting an unknown room is a caller error and leaves the selection
    /// unchanged.
    pub fn select(&mut self, room_id: &RoomId) -> Result<&Room, SyncError> {
        let index = self
            .rooms
            .iter()
            .position(|room| &room.id == room_id)
            .ok_or_else(|| SyncError::UnknownRoom(room_id.clone()))?;

        self.selected = Some(room_id.clone());
        Ok(&self.rooms[index])
    }

    /// Id of the selected room. `None` until the first selection.
    pub fn selected(&self) -> Option<&RoomId> {
        self.selected.as_ref()
    }

    /// Record of the selected room.
    pub fn selected_room(&self) -> Option<&Room> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    /// Look up a room by id.
    pub fn get(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.iter().find(|room| &room.id == room_id)
    }

    /// Find a room from a user-supplied reference.
    ///
    /// Accepts `#n` (1-based position in the list), an exact id, or a name
    /// compared case-insensitively. The first matching name wins.
    pub fn resolve(&self, query: &str) -> Option<&Room> {
        let query = query.trim();
        if let Some(index) = query.strip_prefix('#').and_then(|n| n.parse::<usize>().ok()) {
            return index.checked_sub(1).and_then(|i| self.rooms.get(i));
        }

        self.rooms
            .iter()
            .find(|room| room.id.as_str() == query)
            .or_else(|| self.rooms.iter().find(|room| room.name.eq_ignore_ascii_case(query)))
    }

    /// Whether a room with this id is known.
    pub fn contains(&self, room_id: &RoomId) -> bool {
        self.get(room_id).is_some()
    }

    /// All rooms in arrival order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    /// Number of known rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are known.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
