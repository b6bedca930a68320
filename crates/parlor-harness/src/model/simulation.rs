//! A session wired to a simulated world.

use std::time::Duration;

use parlor_app::{Intent, Session, SessionEvent};
use parlor_core::ReconnectPolicy;
use parlor_proto::{OutgoingMessage, RoomId};

use crate::{
    InvariantRegistry, Operation, SessionSnapshot, SimBackend, SimEnv, Violation, World,
};

/// Upper bound on deliveries in one [`Simulation::settle`].
const SETTLE_LIMIT: usize = 10_000;

/// One session, one world, one clock.
///
/// Intents are applied to the session and its actions served by the world
/// immediately; the resulting events wait in the world's queue until
/// delivered.
pub struct Simulation {
    env: SimEnv,
    session: Session<SimEnv>,
    world: World,
    invariants: InvariantRegistry,
}

impl Simulation {
    /// Start a session against a backend seeded with `rooms`, with the
    /// room directory already loaded.
    pub fn new(seed: u64, rooms: &[&str]) -> Self {
        Self::with_policy(seed, rooms, ReconnectPolicy::default())
    }

    /// Like [`Self::new`] with a custom reconnect policy.
    pub fn with_policy(seed: u64, rooms: &[&str], policy: ReconnectPolicy) -> Self {
        let mut backend = SimBackend::new();
        for name in rooms {
            backend.seed_room(name);
        }

        let env = SimEnv::with_seed(seed);
        let mut sim = Self {
            session: Session::new(env.clone(), "tester", policy),
            env,
            world: World::new(backend),
            invariants: InvariantRegistry::standard(),
        };

        let actions = sim.session.load_rooms();
        sim.world.execute(actions);
        sim.settle();
        sim
    }

    /// Apply an operation, then check invariants.
    ///
    /// # Errors
    ///
    /// Returns every invariant violated after the operation.
    pub fn apply(&mut self, op: Operation) -> Result<(), Vec<Violation>> {
        match op {
            Operation::SelectRoom { room } => {
                if let Some(room_id) = self.room_id(room) {
                    self.intent(Intent::SelectRoom(room_id));
                }
            },
            Operation::CreateRoom { name } => {
                self.intent(Intent::CreateRoom {
                    name: format!("room-{}", name.seed),
                    description: None,
                });
            },
            Operation::SendMessage { text } => self.intent(Intent::SendMessage(text.render())),
            Operation::SendBlank => self.intent(Intent::SendMessage("  \t ".to_owned())),
            Operation::RemotePost { room, text } => {
                if let Some(room_id) = self.room_id(room) {
                    self.world.remote_post(&room_id, "remote", &text.render());
                }
            },
            Operation::RemotePersist { room, text } => {
                if let Some(room_id) = self.room_id(room) {
                    let message = OutgoingMessage::new("remote", text.render());
                    self.world.backend_mut().persist(&room_id, &message);
                }
            },
            Operation::Deliver { index } => {
                self.deliver_at(usize::from(index));
            },
            Operation::DeliverAll => self.settle(),
            Operation::DropConnections => self.world.drop_all_channels(),
            Operation::MalformedFrame => {
                if let Some(tag) = self.session.channels().tag() {
                    self.world.inject_frame(tag.id, "{\"sender\":");
                }
            },
            Operation::SetUnavailable { unavailable } => {
                self.world.backend_mut().set_unavailable(unavailable);
            },
            Operation::AdvanceTime { millis } => {
                self.advance(Duration::from_millis(u64::from(millis)));
            },
        }
        self.check()
    }

    /// Apply a user intent and serve its actions.
    pub fn intent(&mut self, intent: Intent) {
        let actions = self.session.apply(intent);
        self.world.execute(actions);
    }

    /// Feed an event straight to the session and serve its actions.
    pub fn handle(&mut self, event: SessionEvent) {
        let actions = self.session.handle(event);
        self.world.execute(actions);
    }

    /// Deliver the oldest queued event. Returns `false` if none was queued.
    pub fn deliver_next(&mut self) -> bool {
        match self.world.deliver_next() {
            Some(event) => {
                self.handle(event);
                true
            },
            None => false,
        }
    }

    /// Deliver the queued event at `index` (wrapping). Returns `false` if
    /// none was queued.
    pub fn deliver_at(&mut self, index: usize) -> bool {
        match self.world.deliver_at(index) {
            Some(event) => {
                self.handle(event);
                true
            },
            None => false,
        }
    }

    /// Deliver queued events in order until the queue is empty.
    pub fn settle(&mut self) {
        for _ in 0..SETTLE_LIMIT {
            if !self.deliver_next() {
                return;
            }
        }
        tracing::warn!(limit = SETTLE_LIMIT, "simulation did not settle");
    }

    /// Advance the clock and tick the session.
    pub fn advance(&mut self, delta: Duration) {
        self.env.advance(delta);
        self.handle(SessionEvent::Tick);
    }

    /// Check every invariant against the current state.
    ///
    /// # Errors
    ///
    /// Returns every invariant currently violated.
    pub fn check(&self) -> Result<(), Vec<Violation>> {
        self.invariants.check_all(&self.snapshot())
    }

    /// Observable state of session and world.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::capture(&self.session.view(), &self.world)
    }

    /// Backend room at `slot`, wrapping around the room list.
    pub fn room_id(&self, slot: u8) -> Option<RoomId> {
        let rooms = self.world.backend().rooms();
        if rooms.is_empty() {
            return None;
        }
        Some(rooms[usize::from(slot) % rooms.len()].id.clone())
    }

    /// Session under test.
    pub fn session(&self) -> &Session<SimEnv> {
        &self.session
    }

    /// World the session talks to.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable world, for injecting traffic and faults.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Shared clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_loads_directory() {
        let sim = Simulation::new(1, &["general", "random"]);
        assert_eq!(sim.session().registry().len(), 2);
        assert!(sim.session().current_room().is_none());
    }

    #[test]
    fn room_slots_wrap() {
        let sim = Simulation::new(1, &["general", "random"]);
        assert_eq!(sim.room_id(3), Some(RoomId::new("2")));
    }

    #[test]
    fn settle_leaves_queue_empty() {
        let mut sim = Simulation::new(1, &["general"]);
        sim.intent(Intent::SelectRoom(RoomId::new("1")));
        sim.settle();
        assert_eq!(sim.world().pending_len(), 0);
        assert!(sim.check().is_ok());
    }
}
