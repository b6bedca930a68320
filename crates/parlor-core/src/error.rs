//! Suppressed-failure taxonomy.
//!
//! None of these conditions is fatal. The engine recovers locally (drops the
//! event, keeps prior state, or falls back to the durable path) and logs the
//! error; nothing here is surfaced to the user.

use parlor_proto::{ProtocolError, RoomId};
use thiserror::Error;

use crate::ChannelId;

/// A condition the engine recovered from by discarding or ignoring input.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Live-channel frame could not be decoded.
    #[error("malformed frame on channel {channel}: {source}")]
    MalformedFrame {
        /// Channel that delivered the frame.
        channel: ChannelId,
        /// Decode failure.
        #[source]
        source: ProtocolError,
    },

    /// Event from a channel that is no longer bound to the current room.
    #[error("event from stale channel {channel}")]
    StaleChannel {
        /// Channel that delivered the event.
        channel: ChannelId,
    },

    /// History result for a selection that has since been replaced.
    #[error("stale history for room {room_id} (selection {selection})")]
    StaleFetch {
        /// Room the fetch was issued for.
        room_id: RoomId,
        /// Selection epoch the fetch was issued under.
        selection: u64,
    },

    /// Selection of a room the registry does not know.
    #[error("unknown room {0}")]
    UnknownRoom(RoomId),

    /// Outgoing message was blank after trimming.
    #[error("message content is empty")]
    EmptyMessage,

    /// Room creation request had a blank name.
    #[error("room name is empty")]
    EmptyRoomName,

    /// Outgoing message attempted with no room selected.
    #[error("no room selected")]
    NoRoomSelected,
}

impl SyncError {
    /// Returns true if the input was discarded because it belonged to a
    /// superseded channel or selection.
    ///
    /// Stale inputs are expected during room switches and logged at debug
    /// level; everything else is worth a warning or reflects a user input
    /// that was rejected locally.
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleChannel { .. } | Self::StaleFetch { .. })
    }

    /// Returns true if this error rejected local user input before any I/O.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            Self::UnknownRoom(_) | Self::EmptyMessage | Self::EmptyRoomName | Self::NoRoomSelected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superseded_inputs_are_stale() {
        assert!(SyncError::StaleChannel { channel: ChannelId::new(3) }.is_stale());
        assert!(SyncError::StaleFetch { room_id: RoomId::new("r"), selection: 1 }.is_stale());
    }

    #[test]
    fn local_rejections_are_not_stale() {
        for err in [
            SyncError::EmptyMessage,
            SyncError::EmptyRoomName,
            SyncError::NoRoomSelected,
            SyncError::UnknownRoom(RoomId::new("x")),
        ] {
            assert!(!err.is_stale());
            assert!(err.is_rejected_input());
        }
    }

    #[test]
    fn malformed_frames_carry_the_decode_error() {
        let source = parlor_proto::Message::from_frame("{").unwrap_err();
        let err = SyncError::MalformedFrame { channel: ChannelId::new(1), source };
        assert!(!err.is_stale());
        assert!(!err.is_rejected_input());
        assert!(err.to_string().starts_with("malformed frame on channel ch-1"));
    }
}
