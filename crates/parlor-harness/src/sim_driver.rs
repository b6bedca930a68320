//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` provides the same interface as the console driver but for
//! deterministic testing. It implements [`Driver`] so the same
//! [`parlor_app::Runtime`] orchestration code runs in both production and
//! simulation.
//!
//! Inputs come from two places: events the [`World`] has queued, which are
//! always drained first, and a script of inputs supplied by the test. The
//! run ends when both are empty.

use std::collections::VecDeque;

use parlor_app::{Driver, FetchTicket, Input, SessionView};
use parlor_core::{ChannelId, ChannelTag, NewRoom, OutgoingMessage, RoomId};
use thiserror::Error;

use crate::{InvariantRegistry, SessionSnapshot, SharedWorld, World};

/// Error type for simulation driver.
#[derive(Error, Debug, Clone)]
pub enum SimDriverError {
    /// A rendered state broke an invariant.
    #[error("invariant violation after render {render}: {details}")]
    Invariant {
        /// Render count at the time of the violation.
        render: usize,
        /// Violations joined for display.
        details: String,
    },
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] trait so the same [`parlor_app::Runtime`]
/// orchestration code runs in both the console client and simulation tests.
pub struct SimDriver {
    world: SharedWorld,
    script: VecDeque<Input>,
    invariants: Option<InvariantRegistry>,
    renders: usize,
    screen: Vec<String>,
    stopped: bool,
}

impl SimDriver {
    /// Create a driver over a shared world with an input script.
    pub fn new(world: SharedWorld, script: impl IntoIterator<Item = Input>) -> Self {
        Self {
            world,
            script: script.into_iter().collect(),
            invariants: None,
            renders: 0,
            screen: Vec::new(),
            stopped: false,
        }
    }

    /// Enable invariant checking on every render.
    #[must_use]
    pub fn with_invariants(mut self, registry: InvariantRegistry) -> Self {
        self.invariants = Some(registry);
        self
    }

    /// Append an input to the script.
    pub fn push_input(&mut self, input: impl Into<Input>) {
        self.script.push_back(input.into());
    }

    /// Number of renders so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Log lines of the last render, as `sender: content`.
    pub fn screen(&self) -> &[String] {
        &self.screen
    }

    /// Whether [`Driver::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Shared world handle.
    pub fn world(&self) -> &SharedWorld {
        &self.world
    }

    fn next_input(&mut self) -> Option<Input> {
        if let Some(event) = World::lock(&self.world).deliver_next() {
            return Some(Input::Session(event));
        }
        self.script.pop_front()
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;

    async fn poll_event(&mut self) -> Result<Option<Input>, Self::Error> {
        Ok(self.next_input())
    }

    fn fetch_rooms(&mut self) {
        World::lock(&self.world).fetch_rooms();
    }

    fn fetch_history(&mut self, ticket: FetchTicket) {
        World::lock(&self.world).fetch_history(ticket);
    }

    fn create_room(&mut self, request: NewRoom) {
        World::lock(&self.world).create_room(request);
    }

    fn persist_message(&mut self, room_id: RoomId, message: OutgoingMessage) {
        World::lock(&self.world).persist_message(room_id, message);
    }

    fn open_channel(&mut self, channel: ChannelTag) {
        World::lock(&self.world).open_channel(channel);
    }

    fn transmit(&mut self, channel: ChannelTag, message: OutgoingMessage) {
        World::lock(&self.world).transmit(channel, message);
    }

    fn close_channel(&mut self, channel: ChannelId) {
        World::lock(&self.world).close_channel(channel);
    }

    fn render(&mut self, view: &SessionView<'_>) -> Result<(), Self::Error> {
        self.renders += 1;
        self.screen =
            view.messages.iter().map(|m| format!("{}: {}", m.sender, m.content)).collect();

        if let Some(registry) = &self.invariants {
            let snapshot = SessionSnapshot::capture(view, &World::lock(&self.world));
            if let Err(violations) = registry.check_all(&snapshot) {
                let details: Vec<_> = violations.iter().map(ToString::to_string).collect();
                return Err(SimDriverError::Invariant {
                    render: self.renders,
                    details: details.join("; "),
                });
            }
        }
        Ok(())
    }

    async fn stop(&mut self) {
        self.stopped = true;
    }
}

#[cfg(test)]
mod tests {
    use parlor_app::{Intent, SessionEvent};

    use super::*;
    use crate::SimBackend;

    #[tokio::test]
    async fn world_events_come_before_script() {
        let world = World::new(SimBackend::new()).into_shared();
        let mut driver = SimDriver::new(world.clone(), [Input::Intent(Intent::Quit)]);
        World::lock(&world).fetch_rooms();

        let first = driver.poll_event().await.unwrap();
        let second = driver.poll_event().await.unwrap();
        let third = driver.poll_event().await.unwrap();

        assert!(matches!(first, Some(Input::Session(SessionEvent::RoomsLoaded { .. }))));
        assert!(matches!(second, Some(Input::Intent(Intent::Quit))));
        assert!(third.is_none());
    }

    #[test]
    fn requests_reach_world() {
        let mut backend = SimBackend::new();
        let room = backend.seed_room("general");
        let world = World::new(backend).into_shared();
        let mut driver = SimDriver::new(world.clone(), []);

        driver.open_channel(ChannelTag { id: ChannelId::new(1), room_id: room.clone() });
        driver.persist_message(room.clone(), OutgoingMessage::new("a", "x"));

        let world = World::lock(&world);
        assert_eq!(world.connections().len(), 1);
        assert_eq!(world.durable_writes().len(), 1);
        assert_eq!(world.backend().messages(&room).len(), 1);
    }
}
