//! Outgoing message transport selection.
//!
//! A message goes over the live channel when one is open for the selected
//! room, and through the durable HTTP write otherwise. Exactly one path is
//! used per send. The durable path does not echo back; the message appears
//! in the log only if the backend broadcasts it or on the next history load.

use parlor_proto::{OutgoingMessage, RoomId};

use crate::{ChannelManager, ChannelTag, SyncError};

/// Display name used when the user has not chosen one.
pub const DEFAULT_SENDER: &str = "Guest";

/// Path an outgoing message takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Transmit on the open live channel.
    Live(ChannelTag),
    /// Persist through the backend's write endpoint for this room.
    Durable(RoomId),
}

/// Choose the route for a message to `room_id`.
pub fn select<I>(channels: &ChannelManager<I>, room_id: &RoomId) -> Route
where
    I: Copy + Ord + std::ops::Add<std::time::Duration, Output = I>,
{
    match channels.live_route(room_id) {
        Some(tag) => Route::Live(tag.clone()),
        None => Route::Durable(room_id.clone()),
    }
}

/// Build an outgoing message from raw user input.
///
/// Surrounding whitespace is trimmed; blank input is rejected.
pub fn compose(sender: &str, text: &str) -> Result<OutgoingMessage, SyncError> {
    let content = text.trim();
    if content.is_empty() {
        return Err(SyncError::EmptyMessage);
    }
    Ok(OutgoingMessage::new(sender, content))
}

/// Normalize a user-chosen display name, falling back to [`DEFAULT_SENDER`].
pub fn sender_name(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() { DEFAULT_SENDER.to_owned() } else { name.to_owned() }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ChannelCommand;

    #[test]
    fn durable_without_open_channel() {
        let channels = ChannelManager::<Duration>::default();
        let room_id = RoomId::new("r1");
        assert_eq!(select(&channels, &room_id), Route::Durable(room_id));
    }

    #[test]
    fn live_when_channel_open_for_room() {
        let mut channels = ChannelManager::<Duration>::default();
        let commands = channels.open(RoomId::new("r1"));
        let ChannelCommand::Open(tag) = &commands[0] else { panic!("expected open") };
        channels.on_opened(tag.id).unwrap();

        assert_eq!(select(&channels, &RoomId::new("r1")), Route::Live(tag.clone()));
        assert_eq!(
            select(&channels, &RoomId::new("r2")),
            Route::Durable(RoomId::new("r2"))
        );
    }

    #[test]
    fn compose_trims_and_rejects_blank() {
        assert_eq!(compose("Ana", "  hi  ").unwrap(), OutgoingMessage::new("Ana", "hi"));
        assert!(matches!(compose("Ana", " \n\t "), Err(SyncError::EmptyMessage)));
    }

    #[test]
    fn blank_sender_falls_back_to_guest() {
        assert_eq!(sender_name("   "), "Guest");
        assert_eq!(sender_name(" Ana "), "Ana");
    }
}
