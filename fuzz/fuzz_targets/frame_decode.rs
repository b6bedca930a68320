//! Fuzz target for inbound live-channel frames.
//!
//! Decodes arbitrary bytes as a frame, then pushes the result through the
//! channel guard and into a message log. Nothing on this path may panic;
//! malformed input must surface as an error and leave the log untouched.

#![no_main]

use std::time::Duration;

use libfuzzer_sys::fuzz_target;
use parlor_core::{ChannelCommand, ChannelManager, MessageLog, RoomId};
use parlor_proto::Message;

fuzz_target!(|data: &[u8]| {
    let decoded = Message::from_frame_bytes(data);

    let room_id = RoomId::new("1");
    let mut channels = ChannelManager::<Duration>::default();
    let Some(ChannelCommand::Open(tag)) = channels.open(room_id.clone()).pop() else {
        return;
    };
    let _ = channels.on_opened(tag.id);

    let mut log = MessageLog::new();
    log.reset(room_id.clone());
    log.replace(Vec::new(), Duration::ZERO);

    let Ok(text) = std::str::from_utf8(data) else {
        assert!(decoded.is_err());
        return;
    };
    match channels.admit(tag.id, text, Some(&room_id)) {
        Ok(message) => {
            assert!(decoded.is_ok());
            log.append(message, Duration::ZERO);
            assert_eq!(log.len(), 1);
        },
        Err(_) => assert!(decoded.is_err()),
    }
});
