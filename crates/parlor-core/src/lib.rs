//! Core synchronization components for Parlor.
//!
//! Pure state machines with no I/O: callers feed in results and events and
//! get back decisions. The session controller in `parlor-app` composes them;
//! the simulation harness drives the same code deterministically.
//!
//! # Components
//!
//! - [`RoomRegistry`]: known rooms and the current selection
//! - [`MessageLog`]: ordered, deduplicated log for the selected room
//! - [`ChannelManager`]: the single live channel, its lifecycle and the
//!   stale-channel guard
//! - [`transport`]: live-vs-durable route selection for outgoing messages
//! - [`Environment`]: time and randomness, swappable for simulation

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod channel;
pub mod env;
pub mod error;
pub mod log;
pub mod reconnect;
pub mod registry;
pub mod transport;

pub use channel::{ChannelCommand, ChannelId, ChannelManager, ChannelState, ChannelTag};
pub use env::Environment;
pub use error::SyncError;
pub use log::{Admission, MessageLog};
pub use parlor_proto::{Message, MessageId, NewRoom, OutgoingMessage, Room, RoomId};
pub use reconnect::ReconnectPolicy;
pub use registry::RoomRegistry;
pub use transport::Route;
