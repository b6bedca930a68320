//! Network I/O primitives for the session.
//!
//! [`Network`] starts requests and live channels in background tasks and
//! funnels every completion back as a [`SessionEvent`] on one queue. Nothing
//! here interprets results; the session decides what a completion means.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use parlor_app::{FetchTicket, SessionEvent};
use parlor_core::{ChannelId, ChannelTag};
use parlor_proto::{NewRoom, OutgoingMessage, RoomId};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinSet,
};
use tracing::{debug, warn};

use crate::{ClientConfig, HttpBackend, LiveChannel, TransportError};

/// How long [`Network::shutdown`] waits for close handshakes.
pub const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Background I/O for one session.
///
/// Must be used from within a tokio runtime.
pub struct Network {
    http: Arc<HttpBackend>,
    events_tx: UnboundedSender<SessionEvent>,
    events_rx: UnboundedReceiver<SessionEvent>,
    channels: HashMap<ChannelId, LiveChannel>,
    requests: JoinSet<()>,
}

impl Network {
    /// Create the network layer from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints do not resolve or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        Ok(Self::with_backend(HttpBackend::new(config)?))
    }

    /// Create the network layer around an existing HTTP backend.
    pub fn with_backend(http: HttpBackend) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            http: Arc::new(http),
            events_tx,
            events_rx,
            channels: HashMap::new(),
            requests: JoinSet::new(),
        }
    }

    /// Wait for the next completion or channel event.
    ///
    /// A `ChannelClosed` also releases the channel's handle.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.events_rx.recv().await?;
        if let SessionEvent::ChannelClosed { channel, .. } = &event {
            self.channels.remove(channel);
        }
        Some(event)
    }

    /// Start loading the room directory.
    pub fn fetch_rooms(&mut self) {
        let http = Arc::clone(&self.http);
        self.request(async move {
            match http.list_rooms().await {
                Ok(rooms) => SessionEvent::RoomsLoaded { rooms },
                Err(err) => SessionEvent::RoomsFailed { reason: err.to_string() },
            }
        });
    }

    /// Start loading a room's history.
    pub fn fetch_history(&mut self, ticket: FetchTicket) {
        let http = Arc::clone(&self.http);
        self.request(async move {
            match http.history(&ticket.room_id).await {
                Ok(messages) => SessionEvent::HistoryLoaded { ticket, messages },
                Err(err) => SessionEvent::HistoryFailed { ticket, reason: err.to_string() },
            }
        });
    }

    /// Start creating a room.
    pub fn create_room(&mut self, request: NewRoom) {
        let http = Arc::clone(&self.http);
        self.request(async move {
            match http.create_room(&request).await {
                Ok(room) => SessionEvent::RoomCreated { room },
                Err(err) => SessionEvent::RoomCreateFailed { reason: err.to_string() },
            }
        });
    }

    /// Start a durable write.
    pub fn persist_message(&mut self, room_id: RoomId, message: OutgoingMessage) {
        let http = Arc::clone(&self.http);
        self.request(async move {
            match http.persist(&room_id, &message).await {
                Ok(()) => SessionEvent::MessagePersisted { room_id },
                Err(err) => SessionEvent::PersistFailed { room_id, reason: err.to_string() },
            }
        });
    }

    /// Connect a live channel.
    pub fn open_channel(&mut self, channel: ChannelTag) {
        let url = match self.http.endpoints().live_channel(&channel.room_id) {
            Ok(url) => url,
            Err(err) => {
                warn!(channel = %channel.id, %err, "no live channel URL");
                self.emit(SessionEvent::ChannelClosed {
                    channel: channel.id,
                    reason: Some(err.to_string()),
                });
                return;
            },
        };

        let id = channel.id;
        let live = LiveChannel::spawn(url.to_string(), channel, self.events_tx.clone());
        if let Some(previous) = self.channels.insert(id, live) {
            previous.abort();
        }
    }

    /// Send on a live channel. A channel that is already gone reports
    /// `TransmitFailed` so the session can fall back.
    pub fn transmit(&mut self, channel: ChannelTag, message: OutgoingMessage) {
        let message = match self.channels.get(&channel.id) {
            Some(live) => match live.transmit(message) {
                Ok(()) => return,
                Err(message) => message,
            },
            None => message,
        };
        debug!(channel = %channel.id, "transmit on finished channel");
        self.emit(SessionEvent::TransmitFailed { channel, message });
    }

    /// Close a live channel gracefully.
    pub fn close_channel(&mut self, channel: ChannelId) {
        match self.channels.get(&channel) {
            Some(live) => live.close(),
            None => debug!(%channel, "close of unknown channel"),
        }
    }

    /// Close every channel with a handshake, then abort whatever is left.
    ///
    /// Waits at most `grace` for the channels to report closed. Events that
    /// arrive meanwhile are dropped.
    pub async fn shutdown(&mut self, grace: Duration) {
        for live in self.channels.values() {
            live.close();
        }

        let closing = async {
            while !self.channels.is_empty() {
                if self.next_event().await.is_none() {
                    break;
                }
            }
        };
        if tokio::time::timeout(grace, closing).await.is_err() {
            warn!(open = self.channels.len(), "channels still open after close grace");
        }
        self.stop();
    }

    /// Abort every request and channel.
    pub fn stop(&mut self) {
        for (_, live) in self.channels.drain() {
            live.abort();
        }
        self.requests.abort_all();
    }

    /// Number of live channel handles held.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn request<F>(&mut self, request: F)
    where
        F: Future<Output = SessionEvent> + Send + 'static,
    {
        while self.requests.try_join_next().is_some() {}

        let events = self.events_tx.clone();
        self.requests.spawn(async move {
            let _ = events.send(request.await);
        });
    }

    fn emit(&self, event: SessionEvent) {
        let _ = self.events_tx.send(event);
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        self.stop();
    }
}
