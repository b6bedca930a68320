//! Room directory records.

use serde::{Deserialize, Serialize};

use crate::RoomId;

/// A chat room as listed by the room directory.
///
/// Immutable once received; the client never renames or deletes rooms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Directory-assigned identifier.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Optional free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Room {
    /// Create a room record.
    pub fn new(id: impl Into<RoomId>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), description: None }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of a room-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRoom {
    /// Requested display name.
    pub name: String,
    /// Optional description. Omitted from the body when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewRoom {
    /// Build a creation request from user input.
    ///
    /// The name is trimmed; a blank description is treated as absent.
    /// Returns `None` if the name is blank.
    pub fn from_input(name: &str, description: Option<&str>) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let description =
            description.map(str::trim).filter(|d| !d.is_empty()).map(ToOwned::to_owned);
        Some(Self { name: name.to_owned(), description })
    }
}
