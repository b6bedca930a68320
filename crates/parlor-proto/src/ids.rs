//! Opaque identifiers.
//!
//! The backend is free to mint ids as JSON strings or JSON integers, so both
//! forms are accepted on decode. Internally an id is just its textual form;
//! the client never does arithmetic on ids or relies on their ordering.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Either form an id may take on the wire.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Unsigned(u64),
    Signed(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Unsigned(n) => n.to_string(),
            RawId::Signed(n) => n.to_string(),
        }
    }
}

/// Identifier of a room in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Wrap a textual id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Textual form, as used in URL path segments.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RoomId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier the backend assigns to a stored message.
///
/// Absent on messages the backend has not acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a textual id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_textual_ids_decode_to_same_value() {
        let numeric: RoomId = serde_json::from_str("42").unwrap();
        let textual: RoomId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(numeric, textual);
        assert_eq!(numeric.as_str(), "42");
    }

    #[test]
    fn negative_ids_are_accepted() {
        let id: MessageId = serde_json::from_str("-7").unwrap();
        assert_eq!(id.as_str(), "-7");
    }

    #[test]
    fn ids_serialize_as_strings() {
        let id = RoomId::new("65f0c1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"65f0c1\"");
    }

    #[test]
    fn non_scalar_ids_are_rejected() {
        assert!(serde_json::from_str::<RoomId>("{\"oid\":1}").is_err());
        assert!(serde_json::from_str::<MessageId>("1.5").is_err());
    }
}
