//! Deterministic simulation harness for Parlor session testing.
//!
//! In-memory implementations of the environment, the chat backend and the
//! network between them, so session behavior under arbitrary interleavings
//! is reproducible from a seed.
//!
//! # Components
//!
//! - [`SimEnv`]: virtual clock and seeded randomness
//! - [`SimBackend`]: in-memory room directory, history store and broadcaster
//! - [`World`]: backend plus the in-flight completions and channel events,
//!   with control over delivery order
//! - [`SimDriver`]: [`parlor_app::Driver`] over a shared [`World`]
//! - [`Simulation`]: a session wired to a world, driven by [`Operation`]s
//!
//! # Invariant Testing
//!
//! The `invariants` module verifies properties that must hold after every
//! step. Use [`InvariantRegistry::standard()`] for the session invariants.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod model;
pub mod sim_backend;
pub mod sim_driver;
pub mod sim_env;
pub mod world;

pub use invariants::{
    EmptyWithoutRoom, Invariant, InvariantKind, InvariantRegistry, InvariantResult,
    NoDuplicateIds, RoomIsolation, SessionSnapshot, SingleBoundChannel, UniqueRoomIds, Violation,
};
pub use model::{Operation, Simulation, SmallText};
pub use sim_backend::SimBackend;
pub use sim_driver::{SimDriver, SimDriverError};
pub use sim_env::{SimEnv, SimInstant};
pub use world::{SharedWorld, World};
