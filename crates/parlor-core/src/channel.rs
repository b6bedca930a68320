//! Live channel lifecycle.
//!
//! At most one live channel is bound at a time, and it is always bound to a
//! single room. Every open gets a fresh [`ChannelId`]; events carrying any
//! other id are stale and discarded. This is what keeps a closing channel
//! from leaking messages into the next room's log.
//!
//! # State Machine
//!
//! ```text
//!                open()
//!                  │
//!                  ▼
//!   ┌──────────► Connecting ──on_opened──► Open
//!   │              │                        │
//!   │              └──────┬─────────────────┘
//!   │          unexpected │         close()
//! poll_retry              ▼            │
//!   │                   Idle           ▼
//!   └─────────────────(backoff)     Closing ──on_closed──► Closed
//! ```
//!
//! An unexpected close parks the channel in `Idle` until its retry instant;
//! when the policy is exhausted (or disabled) it goes straight to `Closed`.

use std::{fmt, time::Duration};

use parlor_proto::{Message, RoomId};
use tracing::{debug, warn};

use crate::{ReconnectPolicy, SyncError};

/// Identity of one live channel instance.
///
/// Ids are never reused within a session, so a reconnect to the same room is
/// a different channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
    /// Wrap a raw channel sequence number.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw sequence number.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch-{}", self.0)
    }
}

/// A channel id together with the room it is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelTag {
    /// Channel instance.
    pub id: ChannelId,
    /// Room whose live endpoint the channel connects to.
    pub room_id: RoomId,
}

/// Lifecycle state of the bound channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Dropped unexpectedly; waiting for the reconnect delay to elapse.
    Idle,
    /// Open requested; not yet confirmed.
    Connecting,
    /// Accepting frames and transmissions.
    Open,
    /// Close requested; waiting for confirmation.
    Closing,
    /// Terminal. No further events are expected.
    Closed,
}

/// Instruction for the I/O layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCommand {
    /// Connect to the room's live endpoint under this tag.
    Open(ChannelTag),
    /// Tear down the channel with this id.
    Close(ChannelId),
}

#[derive(Debug, Clone)]
struct Channel<I> {
    tag: ChannelTag,
    state: ChannelState,
    attempt: u32,
    retry_at: Option<I>,
}

impl<I> Channel<I> {
    fn connecting(tag: ChannelTag, attempt: u32) -> Self {
        Self { tag, state: ChannelState::Connecting, attempt, retry_at: None }
    }
}

/// Owner of the single bound live channel.
#[derive(Debug, Clone)]
pub struct ChannelManager<I> {
    current: Option<Channel<I>>,
    next_id: u64,
    policy: ReconnectPolicy,
}

impl<I> Default for ChannelManager<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}

impl<I> ChannelManager<I>
where
    I: Copy + Ord + std::ops::Add<Duration, Output = I>,
{
    /// Create a manager with no channel bound.
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { current: None, next_id: 1, policy }
    }

    /// Bind a new channel to `room_id`.
    ///
    /// Any previously bound channel is released first; the returned commands
    /// list its close (if it still had a socket) before the new open.
    pub fn open(&mut self, room_id: RoomId) -> Vec<ChannelCommand> {
        let mut commands = Vec::with_capacity(2);
        if let Some(id) = self.close() {
            commands.push(ChannelCommand::Close(id));
        }

        let tag = self.allocate(room_id);
        self.current = Some(Channel::connecting(tag.clone(), 0));
        commands.push(ChannelCommand::Open(tag));
        commands
    }

    /// Request the bound channel to close.
    ///
    /// Returns the id to tear down if a socket may exist. Calling this on an
    /// already closing or closed channel does nothing.
    pub fn close(&mut self) -> Option<ChannelId> {
        let channel = self.current.as_mut()?;
        match channel.state {
            ChannelState::Connecting | ChannelState::Open => {
                channel.state = ChannelState::Closing;
                Some(channel.tag.id)
            },
            ChannelState::Idle => {
                channel.state = ChannelState::Closed;
                channel.retry_at = None;
                None
            },
            ChannelState::Closing | ChannelState::Closed => None,
        }
    }

    /// Confirm that channel `id` finished connecting.
    pub fn on_opened(&mut self, id: ChannelId) -> Result<(), SyncError> {
        let channel = self.current_mut(id)?;
        if channel.state != ChannelState::Connecting {
            return Err(SyncError::StaleChannel { channel: id });
        }
        channel.state = ChannelState::Open;
        channel.attempt = 0;
        Ok(())
    }

    /// Accept a frame from channel `id` and decode it.
    ///
    /// The frame is rejected as stale unless `id` is the bound channel, it is
    /// live, and it is bound to `current_room`.
    pub fn admit(
        &self,
        id: ChannelId,
        payload: &str,
        current_room: Option<&RoomId>,
    ) -> Result<Message, SyncError> {
        let channel = self.current_ref(id)?;
        let live = matches!(channel.state, ChannelState::Connecting | ChannelState::Open);
        if !live || current_room != Some(&channel.tag.room_id) {
            return Err(SyncError::StaleChannel { channel: id });
        }

        Message::from_frame(payload)
            .map_err(|source| SyncError::MalformedFrame { channel: id, source })
    }

    /// Record that channel `id` has closed.
    ///
    /// An expected close (after [`Self::close`]) is terminal. An unexpected
    /// one schedules a reconnect if the policy allows, returning the delay;
    /// `jitter` is the random input for the backoff.
    pub fn on_closed(
        &mut self,
        id: ChannelId,
        now: I,
        jitter: u64,
    ) -> Result<Option<Duration>, SyncError> {
        let policy = self.policy;
        let channel = self.current_mut(id)?;
        match channel.state {
            ChannelState::Closing => {
                channel.state = ChannelState::Closed;
                Ok(None)
            },
            ChannelState::Connecting | ChannelState::Open => {
                if !policy.allows(channel.attempt) {
                    if policy.max_attempts > 0 {
                        warn!(channel = %id, attempts = channel.attempt, "reconnect exhausted");
                    }
                    channel.state = ChannelState::Closed;
                    return Ok(None);
                }
                let delay = policy.delay(channel.attempt, jitter);
                debug!(channel = %id, attempt = channel.attempt, ?delay, "reconnect scheduled");
                channel.attempt += 1;
                channel.state = ChannelState::Idle;
                channel.retry_at = Some(now + delay);
                Ok(Some(delay))
            },
            ChannelState::Idle | ChannelState::Closed => {
                Err(SyncError::StaleChannel { channel: id })
            },
        }
    }

    /// Start a reconnect if one is due.
    ///
    /// The replacement channel gets a new id. If the selection has moved
    /// away from the channel's room the retry is abandoned.
    pub fn poll_retry(&mut self, now: I, current_room: Option<&RoomId>) -> Option<ChannelTag> {
        let channel = self.current.as_mut()?;
        if channel.state != ChannelState::Idle {
            return None;
        }
        if current_room != Some(&channel.tag.room_id) {
            channel.state = ChannelState::Closed;
            channel.retry_at = None;
            return None;
        }
        if channel.retry_at.is_some_and(|at| at > now) {
            return None;
        }

        let room_id = channel.tag.room_id.clone();
        let attempt = channel.attempt;
        let tag = self.allocate(room_id);
        self.current = Some(Channel::connecting(tag.clone(), attempt));
        Some(tag)
    }

    /// Channel to transmit on for `room_id`, if one is open and bound there.
    pub fn live_route(&self, room_id: &RoomId) -> Option<&ChannelTag> {
        self.current
            .as_ref()
            .filter(|c| c.state == ChannelState::Open && &c.tag.room_id == room_id)
            .map(|c| &c.tag)
    }

    /// Tag of the bound channel, if any.
    pub fn tag(&self) -> Option<&ChannelTag> {
        self.current.as_ref().map(|c| &c.tag)
    }

    /// State of the bound channel, if any.
    pub fn state(&self) -> Option<ChannelState> {
        self.current.as_ref().map(|c| c.state)
    }

    /// When the pending reconnect is due, if one is scheduled.
    pub fn retry_at(&self) -> Option<I> {
        self.current.as_ref().and_then(|c| c.retry_at)
    }

    /// Reconnect attempts made since the channel last opened.
    pub fn attempts(&self) -> u32 {
        self.current.as_ref().map_or(0, |c| c.attempt)
    }

    /// Whether the bound channel is in a non-terminal state.
    pub fn is_active(&self) -> bool {
        self.state().is_some_and(|s| s != ChannelState::Closed)
    }

    fn allocate(&mut self, room_id: RoomId) -> ChannelTag {
        let id = ChannelId(self.next_id);
        self.next_id += 1;
        ChannelTag { id, room_id }
    }

    fn current_ref(&self, id: ChannelId) -> Result<&Channel<I>, SyncError> {
        self.current
            .as_ref()
            .filter(|c| c.tag.id == id)
            .ok_or(SyncError::StaleChannel { channel: id })
    }

    fn current_mut(&mut self, id: ChannelId) -> Result<&mut Channel<I>, SyncError> {
        self.current
            .as_mut()
            .filter(|c| c.tag.id == id)
            .ok_or(SyncError::StaleChannel { channel: id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Manager = ChannelManager<Duration>;

    const T0: Duration = Duration::ZERO;

    fn room(id: &str) -> RoomId {
        RoomId::new(id)
    }

    fn opened(room_id: &str) -> (Manager, ChannelId) {
        let mut channels = Manager::default();
        let commands = channels.open(room(room_id));
        let ChannelCommand::Open(tag) = &commands[0] else { panic!("expected open") };
        let id = tag.id;
        channels.on_opened(id).unwrap();
        (channels, id)
    }

    #[test]
    fn open_replaces_previous_channel() {
        let (mut channels, first) = opened("r1");

        let commands = channels.open(room("r2"));

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0], ChannelCommand::Close(first));
        let ChannelCommand::Open(tag) = &commands[1] else { panic!("expected open") };
        assert_ne!(tag.id, first);
        assert_eq!(tag.room_id, room("r2"));
        assert_eq!(channels.state(), Some(ChannelState::Connecting));
    }

    #[test]
    fn frames_from_replaced_channel_are_stale() {
        let (mut channels, first) = opened("r1");
        channels.open(room("r2"));

        let err = channels.admit(first, r#"{"sender":"a","content":"x"}"#, Some(&room("r2")));

        assert!(matches!(err, Err(SyncError::StaleChannel { .. })));
    }

    #[test]
    fn frames_for_other_room_are_stale() {
        let (channels, id) = opened("r1");
        let err = channels.admit(id, r#"{"sender":"a","content":"x"}"#, Some(&room("r2")));
        assert!(matches!(err, Err(SyncError::StaleChannel { .. })));
    }

    #[test]
    fn malformed_frame_is_reported() {
        let (channels, id) = opened("r1");
        let err = channels.admit(id, "not json", Some(&room("r1")));
        assert!(matches!(err, Err(SyncError::MalformedFrame { .. })));
    }

    #[test]
    fn frame_from_bound_channel_decodes() {
        let (channels, id) = opened("r1");
        let frame = r#"{"id":4,"sender":"a","content":"x"}"#;
        let message = channels.admit(id, frame, Some(&room("r1"))).unwrap();
        assert_eq!(message.content, "x");
    }

    #[test]
    fn close_is_idempotent() {
        let (mut channels, id) = opened("r1");

        assert_eq!(channels.close(), Some(id));
        assert_eq!(channels.close(), None);
        assert_eq!(channels.state(), Some(ChannelState::Closing));

        assert_eq!(channels.on_closed(id, T0, 0).unwrap(), None);
        assert_eq!(channels.state(), Some(ChannelState::Closed));
        assert_eq!(channels.close(), None);
    }

    #[test]
    fn unexpected_close_schedules_retry() {
        let (mut channels, id) = opened("r1");

        let delay = channels.on_closed(id, T0, 0).unwrap().unwrap();

        assert_eq!(channels.state(), Some(ChannelState::Idle));
        assert!(channels.poll_retry(T0, Some(&room("r1"))).is_none());

        let tag = channels.poll_retry(delay, Some(&room("r1"))).unwrap();
        assert_ne!(tag.id, id);
        assert_eq!(tag.room_id, room("r1"));
        assert_eq!(channels.state(), Some(ChannelState::Connecting));
        assert_eq!(channels.attempts(), 1);
    }

    #[test]
    fn retry_abandoned_after_room_change() {
        let (mut channels, id) = opened("r1");
        channels.on_closed(id, T0, 0).unwrap();

        assert!(channels.poll_retry(Duration::from_secs(60), Some(&room("r2"))).is_none());
        assert_eq!(channels.state(), Some(ChannelState::Closed));
    }

    #[test]
    fn disabled_policy_closes_on_drop() {
        let mut channels = Manager::new(ReconnectPolicy::disabled());
        channels.open(room("r1"));
        let id = channels.tag().unwrap().id;

        assert_eq!(channels.on_closed(id, T0, 0).unwrap(), None);
        assert_eq!(channels.state(), Some(ChannelState::Closed));
    }

    #[test]
    fn repeated_failures_exhaust_default_policy() {
        let policy = ReconnectPolicy::default();
        let mut channels = Manager::new(policy);
        channels.open(room("r1"));
        let mut id = channels.tag().unwrap().id;
        let mut now = T0;
        let mut retries = 0;

        while let Some(delay) = channels.on_closed(id, now, u64::MAX).unwrap() {
            assert!(delay <= policy.max_delay);
            now += delay;
            id = channels.poll_retry(now, Some(&room("r1"))).unwrap().id;
            retries += 1;
            assert!(retries <= policy.max_attempts, "retries never stopped");
        }

        assert_eq!(retries, policy.max_attempts);
        assert_eq!(channels.state(), Some(ChannelState::Closed));
        assert!(channels.retry_at().is_none());
        assert!(channels.poll_retry(now + policy.max_delay, Some(&room("r1"))).is_none());
        assert_eq!(channels.state(), Some(ChannelState::Closed));
    }

    #[test]
    fn successful_open_resets_attempts() {
        let (mut channels, id) = opened("r1");
        let delay = channels.on_closed(id, T0, 0).unwrap().unwrap();
        let tag = channels.poll_retry(delay, Some(&room("r1"))).unwrap();

        channels.on_opened(tag.id).unwrap();

        assert_eq!(channels.attempts(), 0);
        assert_eq!(channels.live_route(&room("r1")), Some(&tag));
    }

    #[test]
    fn closing_idle_channel_needs_no_teardown() {
        let (mut channels, id) = opened("r1");
        channels.on_closed(id, T0, 0).unwrap();

        assert_eq!(channels.close(), None);
        assert_eq!(channels.state(), Some(ChannelState::Closed));
        assert!(channels.retry_at().is_none());
    }

    #[test]
    fn live_route_requires_open_state() {
        let mut channels = Manager::default();
        channels.open(room("r1"));
        assert_eq!(channels.live_route(&room("r1")), None);
    }
}
