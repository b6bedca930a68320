//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use parlor_core::ChannelState;

use super::{Invariant, InvariantKind, InvariantResult, SessionSnapshot, Violation};

/// At most one live connection exists, and it belongs to the selected room.
///
/// Checked on both sides: the server must hold at most one connection, on
/// the selected room, and the session's own channel (unless closed) must be
/// bound to the selected room.
pub struct SingleBoundChannel;

impl Invariant for SingleBoundChannel {
    fn kind(&self) -> InvariantKind {
        InvariantKind::SingleBoundChannel
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let violation = |message: String| Err(Violation { invariant: self.kind(), message });

        if state.connections.len() > 1 {
            return violation(format!("{} live connections", state.connections.len()));
        }

        if let Some(current) = &state.current_room {
            if let Some(room) = state.connections.iter().find(|room| *room != current) {
                return violation(format!("connection on {room} while {current} is selected"));
            }
            let closed = state.channel_state == Some(ChannelState::Closed);
            if let Some(room) = &state.channel_room
                && room != current
                && !closed
            {
                return violation(format!("channel bound to {room} while {current} is selected"));
            }
        }
        Ok(())
    }
}

/// Every message in the log was posted to the selected room.
///
/// Messages the backend never stored are skipped; they have no known origin.
pub struct RoomIsolation;

impl Invariant for RoomIsolation {
    fn kind(&self) -> InvariantKind {
        InvariantKind::RoomIsolation
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let Some(current) = &state.current_room else {
            return Ok(());
        };
        for (message, origin) in &state.messages {
            if let Some(origin) = origin
                && origin != current
            {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!(
                        "message {:?} from {origin} shown in {current}",
                        message.id.as_ref().map(|id| id.as_str())
                    ),
                });
            }
        }
        Ok(())
    }
}

/// No two registry entries share an id.
pub struct UniqueRoomIds;

impl Invariant for UniqueRoomIds {
    fn kind(&self) -> InvariantKind {
        InvariantKind::UniqueRoomIds
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for room in &state.rooms {
            if !seen.insert(room) {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("room {room} listed twice"),
                });
            }
        }
        Ok(())
    }
}

/// No message id appears twice in the log.
pub struct NoDuplicateIds;

impl Invariant for NoDuplicateIds {
    fn kind(&self) -> InvariantKind {
        InvariantKind::NoDuplicateIds
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let mut seen = HashSet::new();
        for id in state.messages.iter().filter_map(|(message, _)| message.id.as_ref()) {
            if !seen.insert(id) {
                return Err(Violation {
                    invariant: self.kind(),
                    message: format!("message {id} shown twice"),
                });
            }
        }
        Ok(())
    }
}

/// Nothing is shown before a room is selected.
pub struct EmptyWithoutRoom;

impl Invariant for EmptyWithoutRoom {
    fn kind(&self) -> InvariantKind {
        InvariantKind::EmptyWithoutRoom
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.current_room.is_none() && !state.messages.is_empty() {
            return Err(Violation {
                invariant: self.kind(),
                message: format!("{} messages with no room selected", state.messages.len()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use parlor_proto::{Message, RoomId};

    use super::*;

    fn room(id: &str) -> RoomId {
        RoomId::new(id)
    }

    #[test]
    fn second_connection_is_flagged() {
        let snapshot = SessionSnapshot::default()
            .with_current_room(Some(room("1")))
            .with_connection(room("1"))
            .with_connection(room("1"));

        assert!(SingleBoundChannel.check(&snapshot).is_err());
    }

    #[test]
    fn connection_on_other_room_is_flagged() {
        let snapshot = SessionSnapshot::default()
            .with_current_room(Some(room("2")))
            .with_connection(room("1"));

        assert!(SingleBoundChannel.check(&snapshot).is_err());
    }

    #[test]
    fn closed_channel_on_old_room_is_allowed() {
        let snapshot = SessionSnapshot::default()
            .with_current_room(Some(room("2")))
            .with_channel(room("1"), ChannelState::Closed);

        assert!(SingleBoundChannel.check(&snapshot).is_ok());
    }

    #[test]
    fn foreign_message_is_flagged() {
        let snapshot = SessionSnapshot::default()
            .with_current_room(Some(room("2")))
            .with_message(Message::new("5", "a", "x"), Some(room("1")));

        let violation = RoomIsolation.check(&snapshot).unwrap_err();
        assert_eq!(violation.invariant, InvariantKind::RoomIsolation);
    }

    #[test]
    fn repeated_room_id_is_flagged() {
        let snapshot = SessionSnapshot::default().with_rooms([room("1"), room("1")]);
        assert!(UniqueRoomIds.check(&snapshot).is_err());
    }

    #[test]
    fn repeated_message_id_is_flagged() {
        let snapshot = SessionSnapshot::default()
            .with_current_room(Some(room("1")))
            .with_message(Message::new("5", "a", "x"), None)
            .with_message(Message::new("5", "a", "x"), None);

        assert!(NoDuplicateIds.check(&snapshot).is_err());
    }

    #[test]
    fn messages_without_room_are_flagged() {
        let snapshot =
            SessionSnapshot::default().with_message(Message::anonymous("a", "x"), None);
        assert!(EmptyWithoutRoom.check(&snapshot).is_err());
    }
}
