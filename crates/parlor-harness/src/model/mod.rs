//! Model-based simulation.
//!
//! A [`Simulation`] wires one [`parlor_app::Session`] to a [`crate::World`]
//! and applies [`Operation`]s to it: user intents, deliveries in chosen
//! orders, remote traffic, dropped connections and the passage of time.
//! Invariants are checked after every operation.

mod operation;
mod simulation;

pub use operation::{Operation, SmallText};
pub use simulation::Simulation;
