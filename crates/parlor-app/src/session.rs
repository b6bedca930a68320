//! Session controller.
//!
//! This module defines the [`Session`] state machine, which ties the room
//! registry, message log and live channel together. It consumes
//! [`crate::Intent`]s and [`crate::SessionEvent`]s and produces
//! [`crate::SessionAction`]s; it performs no I/O itself.
//!
//! # States
//!
//! `NoRoomSelected` until the first selection, then `RoomSelected(id)` for
//! the rest of the process. Every selection change clears the log, issues a
//! history fetch under a fresh [`FetchTicket`] and binds a fresh live
//! channel, closing the previous one without waiting for it.
//!
//! # Failure handling
//!
//! Nothing is fatal. Failed fetches leave prior state alone, malformed and
//! stale inputs are dropped, and a send on a dead channel falls back to the
//! durable path. Every suppressed condition is logged.

use parlor_core::{
    Admission, ChannelCommand, ChannelId, ChannelManager, ChannelState, Environment, MessageLog,
    NewRoom, ReconnectPolicy, RoomId, RoomRegistry, SyncError,
    transport::{self, Route},
};
use tracing::{debug, info, warn};

use crate::{FetchTicket, Intent, SessionAction, SessionEvent, SessionView};

/// Session controller state machine.
///
/// Pure state machine that processes intents and events and produces
/// actions. Time and randomness come from the [`Environment`].
#[derive(Debug, Clone)]
pub struct Session<E: Environment> {
    env: E,
    registry: RoomRegistry,
    log: MessageLog<E::Instant>,
    channels: ChannelManager<E::Instant>,
    /// Incremented on every selection transition.
    selection: u64,
    /// History fetch whose completion is still wanted.
    pending_fetch: Option<FetchTicket>,
    sender: String,
}

impl<E: Environment> Session<E> {
    /// Create a session with no rooms and nothing selected.
    pub fn new(env: E, sender: &str, reconnect: ReconnectPolicy) -> Self {
        Self {
            env,
            registry: RoomRegistry::new(),
            log: MessageLog::new(),
            channels: ChannelManager::new(reconnect),
            selection: 0,
            pending_fetch: None,
            sender: transport::sender_name(sender),
        }
    }

    /// Request the room directory. Issued once at startup.
    pub fn load_rooms(&mut self) -> Vec<SessionAction> {
        vec![SessionAction::FetchRooms]
    }

    /// Dispatch a user intent.
    ///
    /// [`Intent::Quit`] is handled as [`Self::shutdown`].
    pub fn apply(&mut self, intent: Intent) -> Vec<SessionAction> {
        match intent {
            Intent::SelectRoom(room_id) => self.select_room(&room_id),
            Intent::JoinRoom(query) => match self.registry.resolve(&query) {
                Some(room) => {
                    let room_id = room.id.clone();
                    self.select_room(&room_id)
                },
                None => {
                    debug!(%query, "no room matches");
                    vec![]
                },
            },
            Intent::CreateRoom { name, description } => {
                self.create_room(&name, description.as_deref())
            },
            Intent::SendMessage(text) => self.send_message(&text),
            Intent::SetSender(name) => self.set_sender(&name),
            Intent::Quit => self.shutdown(),
        }
    }

    /// Select a known room.
    ///
    /// Re-selecting the current room does nothing while its channel is live
    /// or waiting to reconnect; once the channel has closed it runs the full
    /// transition again. Unknown rooms are ignored.
    pub fn select_room(&mut self, room_id: &RoomId) -> Vec<SessionAction> {
        if self.registry.selected() == Some(room_id) && self.channel_is_live() {
            debug!(room = %room_id, "room already selected");
            return vec![];
        }

        if let Err(err) = self.registry.select(room_id) {
            debug!(%err, "selection ignored");
            return vec![];
        }

        self.selection += 1;
        self.log.reset(room_id.clone());

        let ticket = FetchTicket { room_id: room_id.clone(), selection: self.selection };
        self.pending_fetch = Some(ticket.clone());
        info!(room = %room_id, selection = self.selection, "room selected");

        let mut actions = vec![SessionAction::FetchHistory { ticket }];
        actions.extend(self.channels.open(room_id.clone()).into_iter().map(channel_action));
        actions.push(SessionAction::Render);
        actions
    }

    /// Ask the directory to create a room; it is selected once created.
    ///
    /// The name is trimmed and must not be blank. A blank description is
    /// sent as absent.
    pub fn create_room(&mut self, name: &str, description: Option<&str>) -> Vec<SessionAction> {
        match NewRoom::from_input(name, description) {
            Some(request) => vec![SessionAction::CreateRoom { request }],
            None => {
                debug!(err = %SyncError::EmptyRoomName, "room creation rejected");
                vec![]
            },
        }
    }

    /// Send a message to the selected room.
    ///
    /// Goes over the live channel when it is open for the room and through
    /// the durable write otherwise. Blank input and sends with no room
    /// selected produce nothing.
    pub fn send_message(&mut self, text: &str) -> Vec<SessionAction> {
        let Some(room_id) = self.registry.selected().cloned() else {
            debug!(err = %SyncError::NoRoomSelected, "send rejected");
            return vec![];
        };

        let message = match transport::compose(&self.sender, text) {
            Ok(message) => message,
            Err(err) => {
                debug!(%err, "send rejected");
                return vec![];
            },
        };

        match transport::select(&self.channels, &room_id) {
            Route::Live(channel) => vec![SessionAction::Transmit { channel, message }],
            Route::Durable(room_id) => {
                debug!(room = %room_id, "no open channel, using durable write");
                vec![SessionAction::PersistMessage { room_id, message }]
            },
        }
    }

    /// Change the display name for later sends. Blank names become `Guest`.
    pub fn set_sender(&mut self, name: &str) -> Vec<SessionAction> {
        self.sender = transport::sender_name(name);
        vec![SessionAction::Render]
    }

    /// Release the live channel ahead of process exit.
    pub fn shutdown(&mut self) -> Vec<SessionAction> {
        self.pending_fetch = None;
        match self.channels.close() {
            Some(channel) => vec![SessionAction::CloseChannel { channel }],
            None => vec![],
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SessionAction> {
        match event {
            SessionEvent::Tick => self.handle_tick(),
            SessionEvent::RoomsLoaded { rooms } => {
                let total = rooms.len();
                let added = self.registry.merge(rooms);
                info!(added, skipped = total - added, "room directory loaded");
                vec![SessionAction::Render]
            },
            SessionEvent::RoomsFailed { reason } => {
                warn!(%reason, "room directory unavailable");
                vec![]
            },
            SessionEvent::HistoryLoaded { ticket, messages } => {
                if let Err(err) = self.take_fetch(&ticket) {
                    debug!(%err, "history discarded");
                    return vec![];
                }
                let now = self.env.now();
                let count = messages.len();
                let staged = self.log.replace(messages, now);
                debug!(room = %ticket.room_id, count, staged, "history applied");
                vec![SessionAction::Render]
            },
            SessionEvent::HistoryFailed { ticket, reason } => {
                if let Err(err) = self.take_fetch(&ticket) {
                    debug!(%err, %reason, "failed history discarded");
                    return vec![];
                }
                warn!(room = %ticket.room_id, %reason, "history unavailable");
                let now = self.env.now();
                self.log.abandon_backfill(now);
                vec![SessionAction::Render]
            },
            SessionEvent::RoomCreated { room } => {
                let room_id = room.id.clone();
                if !self.registry.add(room) {
                    debug!(room = %room_id, "created room already known");
                }
                let mut actions = self.select_room(&room_id);
                if actions.is_empty() {
                    actions.push(SessionAction::Render);
                }
                actions
            },
            SessionEvent::RoomCreateFailed { reason } => {
                warn!(%reason, "room creation failed");
                vec![]
            },
            SessionEvent::MessagePersisted { room_id } => {
                debug!(room = %room_id, "message persisted");
                vec![]
            },
            SessionEvent::PersistFailed { room_id, reason } => {
                warn!(room = %room_id, %reason, "durable write failed");
                vec![]
            },
            SessionEvent::ChannelOpened { channel } => match self.channels.on_opened(channel) {
                Ok(()) => {
                    info!(%channel, "live channel open");
                    vec![SessionAction::Render]
                },
                Err(err) => {
                    debug!(%err, "open notification ignored");
                    vec![]
                },
            },
            SessionEvent::ChannelFrame { channel, payload } => {
                self.handle_frame(channel, &payload)
            },
            SessionEvent::ChannelClosed { channel, reason } => {
                let now = self.env.now();
                let jitter = self.env.random_u64();
                match self.channels.on_closed(channel, now, jitter) {
                    Ok(Some(delay)) => {
                        info!(%channel, reason = reason.as_deref(), ?delay, "live channel dropped");
                        vec![SessionAction::Render]
                    },
                    Ok(None) => {
                        debug!(%channel, reason = reason.as_deref(), "live channel closed");
                        vec![SessionAction::Render]
                    },
                    Err(err) => {
                        debug!(%err, "close notification ignored");
                        vec![]
                    },
                }
            },
            SessionEvent::TransmitFailed { channel, message } => {
                warn!(channel = %channel.id, room = %channel.room_id, "transmit failed");
                vec![SessionAction::PersistMessage { room_id: channel.room_id, message }]
            },
        }
    }

    fn handle_tick(&mut self) -> Vec<SessionAction> {
        let now = self.env.now();
        match self.channels.poll_retry(now, self.registry.selected()) {
            Some(channel) => {
                info!(channel = %channel.id, room = %channel.room_id, "reconnecting");
                vec![SessionAction::OpenChannel { channel }, SessionAction::Render]
            },
            None => vec![],
        }
    }

    fn handle_frame(&mut self, channel: ChannelId, payload: &str) -> Vec<SessionAction> {
        let message = match self.channels.admit(channel, payload, self.registry.selected()) {
            Ok(message) => message,
            Err(err) if err.is_stale() => {
                debug!(%err, "frame discarded");
                return vec![];
            },
            Err(err) => {
                warn!(%err, "frame dropped");
                return vec![];
            },
        };

        let now = self.env.now();
        match self.log.append(message, now) {
            Admission::Appended => vec![SessionAction::Render],
            Admission::Staged => {
                debug!(%channel, "live message staged behind history");
                vec![]
            },
            Admission::Duplicate => {
                debug!(%channel, "duplicate message dropped");
                vec![]
            },
        }
    }

    /// Clear the pending fetch if `ticket` is the one still wanted.
    fn take_fetch(&mut self, ticket: &FetchTicket) -> Result<(), SyncError> {
        if self.pending_fetch.as_ref() != Some(ticket) {
            return Err(SyncError::StaleFetch {
                room_id: ticket.room_id.clone(),
                selection: ticket.selection,
            });
        }
        self.pending_fetch = None;
        Ok(())
    }

    fn channel_is_live(&self) -> bool {
        matches!(
            self.channels.state(),
            Some(ChannelState::Connecting | ChannelState::Open | ChannelState::Idle)
        )
    }

    /// Read-only snapshot for rendering.
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            rooms: self.registry.rooms(),
            current_room: self.registry.selected_room(),
            messages: self.log.view(),
            channel: self.channels.state(),
            channel_room: self.channels.tag().map(|tag| &tag.room_id),
            sender: &self.sender,
            loading_history: self.log.is_awaiting_history(),
        }
    }

    /// Room registry.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Message log of the selected room.
    pub fn log(&self) -> &MessageLog<E::Instant> {
        &self.log
    }

    /// Live channel manager.
    pub fn channels(&self) -> &ChannelManager<E::Instant> {
        &self.channels
    }

    /// Selected room id. `None` until the first selection.
    pub fn current_room(&self) -> Option<&RoomId> {
        self.registry.selected()
    }

    /// Display name used for sends.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// History fetch still awaited, if any.
    pub fn pending_fetch(&self) -> Option<&FetchTicket> {
        self.pending_fetch.as_ref()
    }

    /// Environment handle.
    pub fn env(&self) -> &E {
        &self.env
    }
}

fn channel_action(command: ChannelCommand) -> SessionAction {
    match command {
        ChannelCommand::Open(channel) => SessionAction::OpenChannel { channel },
        ChannelCommand::Close(channel) => SessionAction::CloseChannel { channel },
    }
}
