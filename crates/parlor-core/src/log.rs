//! Message log for the selected room.
//!
//! Display order is arrival order: there is no sequence number to sort by.
//! The log is scoped to exactly one room at a time and is cleared whenever
//! the room changes, before anything for the new room is admitted.
//!
//! # Backfill
//!
//! History fetch and channel open race. While the history for the current
//! room is outstanding, live messages are staged in arrival order and
//! appended after the history once it lands (or onto an empty log if the
//! fetch fails). The visible log is therefore always history first, then
//! live traffic.
//!
//! # Deduplication
//!
//! Message ids are remembered per room and repeats are dropped. Messages
//! without an id are matched on sender and content within a short window;
//! this is a heuristic and can drop a genuine quick repeat.

use std::{
    collections::{HashSet, VecDeque},
    ops::Sub,
    time::Duration,
};

use parlor_proto::{Message, MessageId, RoomId};

/// Window within which two id-less messages with the same sender and content
/// are treated as the same message.
pub const DEFAULT_DEDUP_WINDOW: Duration = Duration::from_secs(2);

/// Outcome of offering a live message to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Message is now visible at the end of the log.
    Appended,
    /// History is still loading; message will follow it.
    Staged,
    /// Message was already admitted and was dropped.
    Duplicate,
}

#[derive(Debug, Clone)]
enum Backfill {
    /// History has been applied (or abandoned).
    Settled,
    /// History outstanding; live messages held in arrival order.
    Pending(Vec<Message>),
}

/// Ordered, deduplicated log of the selected room's messages.
#[derive(Debug, Clone)]
pub struct MessageLog<I> {
    room: Option<RoomId>,
    messages: Vec<Message>,
    seen: HashSet<MessageId>,
    recent_anonymous: VecDeque<(I, String, String)>,
    backfill: Backfill,
    window: Duration,
}

impl<I> Default for MessageLog<I>
where
    I: Copy + Sub<Output = Duration>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I> MessageLog<I>
where
    I: Copy + Sub<Output = Duration>,
{
    /// Create an empty log bound to no room.
    pub fn new() -> Self {
        Self::with_dedup_window(DEFAULT_DEDUP_WINDOW)
    }

    /// Create an empty log with a custom id-less dedup window.
    pub fn with_dedup_window(window: Duration) -> Self {
        Self {
            room: None,
            messages: Vec::new(),
            seen: HashSet::new(),
            recent_anonymous: VecDeque::new(),
            backfill: Backfill::Settled,
            window,
        }
    }

    /// Clear the log and bind it to `room_id`, awaiting that room's history.
    pub fn reset(&mut self, room_id: RoomId) {
        self.messages.clear();
        self.seen.clear();
        self.recent_anonymous.clear();
        self.backfill = Backfill::Pending(Vec::new());
        self.room = Some(room_id);
    }

    /// Replace the log with a room's history, then admit any staged live
    /// messages after it.
    ///
    /// History entries with an id already seen earlier in the history are
    /// dropped. Returns the number of staged messages that were appended.
    pub fn replace(&mut self, history: Vec<Message>, now: I) -> usize {
        self.messages.clear();
        self.seen.clear();
        self.recent_anonymous.clear();

        for message in history {
            match &message.id {
                Some(id) => {
                    if !self.seen.insert(id.clone()) {
                        continue;
                    }
                },
                None => self.remember_anonymous(&message, now),
            }
            self.messages.push(message);
        }

        self.drain_staged(now)
    }

    /// Give up on history for the current room and admit staged messages
    /// onto the (empty) log.
    ///
    /// Returns the number of staged messages that were appended.
    pub fn abandon_backfill(&mut self, now: I) -> usize {
        self.drain_staged(now)
    }

    /// Offer a live message.
    pub fn append(&mut self, message: Message, now: I) -> Admission {
        if self.is_duplicate(&message, now) {
            return Admission::Duplicate;
        }

        if let Backfill::Pending(staged) = &mut self.backfill {
            staged.push(message);
            return Admission::Staged;
        }

        self.admit(message, now);
        Admission::Appended
    }

    /// Read-only view for rendering, in display order.
    pub fn view(&self) -> &[Message] {
        &self.messages
    }

    /// Room this log is bound to.
    pub fn room(&self) -> Option<&RoomId> {
        self.room.as_ref()
    }

    /// Whether the history for the current room is still outstanding.
    pub fn is_awaiting_history(&self) -> bool {
        matches!(self.backfill, Backfill::Pending(_))
    }

    /// Number of live messages held back until history arrives.
    pub fn staged_len(&self) -> usize {
        match &self.backfill {
            Backfill::Pending(staged) => staged.len(),
            Backfill::Settled => 0,
        }
    }

    /// Number of visible messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no messages are visible.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn drain_staged(&mut self, now: I) -> usize {
        let staged = match std::mem::replace(&mut self.backfill, Backfill::Settled) {
            Backfill::Pending(staged) => staged,
            Backfill::Settled => return 0,
        };

        let mut appended = 0;
        for message in staged {
            if self.is_duplicate(&message, now) {
                continue;
            }
            self.admit(message, now);
            appended += 1;
        }
        appended
    }

    fn admit(&mut self, message: Message, now: I) {
        match &message.id {
            Some(id) => {
                self.seen.insert(id.clone());
            },
            None => self.remember_anonymous(&message, now),
        }
        self.messages.push(message);
    }

    fn is_duplicate(&mut self, message: &Message, now: I) -> bool {
        match &message.id {
            Some(id) => {
                self.seen.contains(id)
                    || self.staged().iter().any(|m| m.id.as_ref() == Some(id))
            },
            None => {
                self.expire_anonymous(now);
                let matches = |sender: &str, content: &str| {
                    sender == message.sender && content == message.content
                };

                self.recent_anonymous.iter().any(|(_, s, c)| matches(s, c))
                    || self
                        .staged()
                        .iter()
                        .any(|m| m.id.is_none() && matches(&m.sender, &m.content))
            },
        }
    }

    fn staged(&self) -> &[Message] {
        match &self.backfill {
            Backfill::Pending(staged) => staged,
            Backfill::Settled => &[],
        }
    }

    fn remember_anonymous(&mut self, message: &Message, now: I) {
        self.recent_anonymous.push_back((now, message.sender.clone(), message.content.clone()));
    }

    fn expire_anonymous(&mut self, now: I) {
        while let Some((at, _, _)) = self.recent_anonymous.front() {
            if now - *at > self.window {
                self.recent_anonymous.pop_front();
            } else {
                break;
            }
        }
    }
}
