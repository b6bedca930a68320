//! Session invariants.
//!
//! After every simulated step the harness captures a [`SessionSnapshot`]
//! (what the session shows plus what the fake backend sees on the wire) and
//! runs each registered [`Invariant`] over it. A scenario passes only if no
//! check ever reports a [`Violation`], whatever order completions arrived in.
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.check_all(&sim.snapshot())?;
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{
    EmptyWithoutRoom, NoDuplicateIds, RoomIsolation, SingleBoundChannel, UniqueRoomIds,
};
pub use snapshot::SessionSnapshot;
use thiserror::Error;

/// Outcome of a single check.
pub type InvariantResult = Result<(), Violation>;

/// Names a session invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvariantKind {
    /// At most one live connection, bound to the selected room.
    SingleBoundChannel,
    /// Every logged message was posted to the selected room.
    RoomIsolation,
    /// Room ids in the registry are unique.
    UniqueRoomIds,
    /// No message id appears twice in the log.
    NoDuplicateIds,
    /// The log is empty while no room is selected.
    EmptyWithoutRoom,
}

impl InvariantKind {
    /// Short name used in reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::SingleBoundChannel => "single-bound-channel",
            Self::RoomIsolation => "room-isolation",
            Self::UniqueRoomIds => "unique-room-ids",
            Self::NoDuplicateIds => "no-duplicate-ids",
            Self::EmptyWithoutRoom => "empty-without-room",
        }
    }
}

impl fmt::Display for InvariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A broken invariant and what was observed.
#[derive(Debug, Clone, Error)]
#[error("{invariant}: {message}")]
pub struct Violation {
    /// Which invariant broke.
    pub invariant: InvariantKind,
    /// What the snapshot showed.
    pub message: String,
}

/// A property checked against every snapshot.
pub trait Invariant: Send + Sync {
    /// Which invariant this is.
    fn kind(&self) -> InvariantKind;

    /// Check `state`, describing the first problem found.
    fn check(&self, state: &SessionSnapshot) -> InvariantResult;
}

/// Set of invariants run together.
#[derive(Default)]
pub struct InvariantRegistry {
    checks: Vec<Box<dyn Invariant>>,
}

impl fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every session invariant this crate defines.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(SingleBoundChannel);
        registry.add(RoomIsolation);
        registry.add(UniqueRoomIds);
        registry.add(NoDuplicateIds);
        registry.add(EmptyWithoutRoom);
        registry
    }

    /// Register `invariant`. Registering the same kind twice is a no-op.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        if !self.contains(invariant.kind()) {
            self.checks.push(Box::new(invariant));
        }
    }

    /// Whether a check of `kind` is registered.
    pub fn contains(&self, kind: InvariantKind) -> bool {
        self.kinds().any(|k| k == kind)
    }

    /// Registered kinds, in registration order.
    pub fn kinds(&self) -> impl Iterator<Item = InvariantKind> + '_ {
        self.checks.iter().map(|check| check.kind())
    }

    /// Run every check, collecting all violations.
    pub fn check_all(&self, state: &SessionSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> =
            self.checks.iter().filter_map(|check| check.check(state).err()).collect();
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check and panic with all violations, labelled by `context`.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SessionSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let report = violations.iter().map(ToString::to_string).collect::<Vec<_>>();
            panic!("invariants broken {context}:\n  {}", report.join("\n  "));
        }
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
