//! Operations for model-based testing.
//!
//! Operations represent everything that can happen to a session. They are
//! generated randomly (by proptest strategies or the fuzzer) and applied to
//! a [`crate::Simulation`].

use arbitrary::Arbitrary;

/// Room reference, resolved against the backend's room list modulo its
/// length so every value names a real room.
pub type RoomSlot = u8;

/// Operations that can be applied to a simulation.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// User selects a room.
    SelectRoom {
        /// Room to select.
        room: RoomSlot,
    },

    /// User creates a room.
    CreateRoom {
        /// Name seed.
        name: SmallText,
    },

    /// User sends a message to the selected room.
    SendMessage {
        /// Message content.
        text: SmallText,
    },

    /// User sends whitespace only.
    SendBlank,

    /// Another participant posts to a room over the live channel.
    RemotePost {
        /// Target room.
        room: RoomSlot,
        /// Message content.
        text: SmallText,
    },

    /// Another participant persists to a room through the durable path.
    RemotePersist {
        /// Target room.
        room: RoomSlot,
        /// Message content.
        text: SmallText,
    },

    /// Deliver one queued event, chosen by position.
    ///
    /// Positions other than zero reorder delivery, producing races between
    /// history responses, channel events and room switches.
    Deliver {
        /// Queue position (wraps).
        index: u8,
    },

    /// Deliver every queued event in order.
    DeliverAll,

    /// Server drops every live connection.
    DropConnections,

    /// Inject a garbage frame on the session's current channel.
    MalformedFrame,

    /// Toggle backend availability.
    SetUnavailable {
        /// Whether requests fail.
        unavailable: bool,
    },

    /// Advance simulation time and tick the session.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },
}

/// Small message content for testing.
///
/// Kept compact so generated cases stay small; expanded deterministically
/// into a printable string.
#[derive(Debug, Clone, Copy, Arbitrary)]
pub struct SmallText {
    /// Content seed.
    pub seed: u8,
}

impl SmallText {
    /// Expand into message text.
    pub fn render(self) -> String {
        format!("msg-{}", self.seed)
    }
}

#[cfg(test)]
mod tests {
    use arbitrary::Unstructured;

    use super::*;

    #[test]
    fn arbitrary_bytes_yield_operations() {
        let bytes = [7u8; 64];
        let mut input = Unstructured::new(&bytes);
        let ops: Vec<Operation> = input.arbitrary().unwrap();
        assert!(ops.iter().all(|op| !format!("{op:?}").is_empty()));
    }

    #[test]
    fn small_text_is_deterministic() {
        assert_eq!(SmallText { seed: 4 }.render(), "msg-4");
    }
}
