//! WebSocket live channels.
//!
//! Each [`LiveChannel`] owns one socket task. The task reports its lifecycle
//! as session events tagged with the channel id it was opened under:
//! `ChannelOpened` once connected, a `ChannelFrame` per inbound text frame,
//! and exactly one `ChannelClosed` when it ends for any reason (including a
//! failed connect). Messages still queued when the socket ends come back as
//! `TransmitFailed` ahead of that close. Pings and pongs are answered by the
//! socket layer and never surface.

use std::fmt::Display;

use futures::{Sink, SinkExt, StreamExt};
use parlor_app::SessionEvent;
use parlor_core::ChannelTag;
use parlor_proto::OutgoingMessage;
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::SendError},
    task::AbortHandle,
};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, info, warn};

/// Request to the socket task.
#[derive(Debug)]
enum Outbound {
    Message(OutgoingMessage),
    Close,
}

/// Handle to a live channel task.
#[derive(Debug)]
pub struct LiveChannel {
    tag: ChannelTag,
    outbound: UnboundedSender<Outbound>,
    task: AbortHandle,
}

impl LiveChannel {
    /// Connect to `url` in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(url: String, tag: ChannelTag, events: UnboundedSender<SessionEvent>) -> Self {
        let (outbound, requests) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_channel(url, tag.clone(), requests, events));
        Self { tag, outbound, task: task.abort_handle() }
    }

    /// Channel this handle was opened under.
    pub fn tag(&self) -> &ChannelTag {
        &self.tag
    }

    /// Queue a message for sending.
    ///
    /// Hands the message back if the socket task has already ended.
    pub fn transmit(&self, message: OutgoingMessage) -> Result<(), OutgoingMessage> {
        let Err(SendError(Outbound::Message(message))) =
            self.outbound.send(Outbound::Message(message))
        else {
            return Ok(());
        };
        Err(message)
    }

    /// Ask the socket to close gracefully. Its `ChannelClosed` follows.
    pub fn close(&self) {
        if self.outbound.send(Outbound::Close).is_err() {
            debug!(channel = %self.tag.id, "close requested on finished channel");
        }
    }

    /// Kill the socket task without a close handshake.
    pub fn abort(&self) {
        self.task.abort();
    }
}

async fn run_channel(
    url: String,
    tag: ChannelTag,
    mut requests: UnboundedReceiver<Outbound>,
    events: UnboundedSender<SessionEvent>,
) {
    let channel = tag.id;
    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(err) => {
            warn!(%channel, %url, %err, "live channel connect failed");
            let _ = events.send(SessionEvent::ChannelClosed {
                channel,
                reason: Some(err.to_string()),
            });
            return;
        },
    };

    info!(%channel, %url, "live channel connected");
    if events.send(SessionEvent::ChannelOpened { channel }).is_err() {
        return;
    }

    let (mut sink, mut stream) = socket.split();
    let reason = loop {
        tokio::select! {
            request = requests.recv() => match request {
                Some(Outbound::Message(message)) => {
                    if let Err(reason) = send_frame(&mut sink, &message).await {
                        let _ = events.send(SessionEvent::TransmitFailed {
                            channel: tag.clone(),
                            message,
                        });
                        break Some(reason);
                    }
                },
                Some(Outbound::Close) | None => {
                    if let Err(err) = sink.send(WsMessage::Close(None)).await {
                        debug!(%channel, %err, "close handshake failed");
                    }
                    break None;
                },
            },
            frame = stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    let payload = text.as_str().to_owned();
                    if events.send(SessionEvent::ChannelFrame { channel, payload }).is_err() {
                        return;
                    }
                },
                Some(Ok(WsMessage::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(payload) => {
                        if events.send(SessionEvent::ChannelFrame { channel, payload }).is_err() {
                            return;
                        }
                    },
                    Err(_) => warn!(%channel, len = bytes.len(), "non-UTF-8 frame dropped"),
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_owned());
                    break Some(reason);
                },
                Some(Ok(_)) => {},
                Some(Err(err)) => break Some(err.to_string()),
                None => break Some("connection ended".to_owned()),
            },
        }
    };

    let bounced = bounce_queued(&mut requests, &tag, &events);
    debug!(%channel, reason = reason.as_deref(), bounced, "live channel finished");
    let _ = events.send(SessionEvent::ChannelClosed { channel, reason });
}

/// Refuse further requests and report every message still queued as
/// `TransmitFailed`, so each one falls back to the durable write.
///
/// Returns the number of messages bounced.
fn bounce_queued(
    requests: &mut UnboundedReceiver<Outbound>,
    tag: &ChannelTag,
    events: &UnboundedSender<SessionEvent>,
) -> usize {
    requests.close();
    let mut bounced = 0;
    while let Ok(request) = requests.try_recv() {
        if let Outbound::Message(message) = request {
            let _ = events.send(SessionEvent::TransmitFailed { channel: tag.clone(), message });
            bounced += 1;
        }
    }
    bounced
}

async fn send_frame<S>(sink: &mut S, message: &OutgoingMessage) -> Result<(), String>
where
    S: Sink<WsMessage> + Unpin,
    S::Error: Display,
{
    let frame = message.to_frame().map_err(|err| err.to_string())?;
    sink.send(WsMessage::Text(frame.into())).await.map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use parlor_core::{ChannelId, RoomId};

    use super::*;

    #[test]
    fn queued_messages_bounce_when_socket_ends() {
        let tag = ChannelTag { id: ChannelId::new(3), room_id: RoomId::new("1") };
        let (outbound, mut requests) = mpsc::unbounded_channel();
        let (events, mut received) = mpsc::unbounded_channel();
        outbound.send(Outbound::Message(OutgoingMessage::new("a", "one"))).unwrap();
        outbound.send(Outbound::Close).unwrap();
        outbound.send(Outbound::Message(OutgoingMessage::new("a", "two"))).unwrap();

        assert_eq!(bounce_queued(&mut requests, &tag, &events), 2);

        let mut contents = Vec::new();
        while let Ok(event) = received.try_recv() {
            let SessionEvent::TransmitFailed { channel, message } = event else {
                panic!("expected transmit failure, got {event:?}");
            };
            assert_eq!(channel, tag);
            contents.push(message.content);
        }
        assert_eq!(contents, ["one", "two"]);

        // Later sends see a finished channel and are handed back directly.
        assert!(outbound.send(Outbound::Message(OutgoingMessage::new("a", "x"))).is_err());
    }
}
