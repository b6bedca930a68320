//! Wire protocol for the Parlor chat backend.
//!
//! The backend speaks plain JSON over two transports: request/response HTTP
//! for the room directory and message history, and a per-room WebSocket live
//! channel for immediate delivery. This crate owns the shapes that cross
//! those transports and the URL layout used to reach them.
//!
//! # Components
//!
//! - [`Room`], [`NewRoom`]: room directory records and creation requests
//! - [`Message`]: a delivered chat message (history replay or live frame)
//! - [`OutgoingMessage`]: the body of a send, on either transport
//! - [`RoomId`], [`MessageId`]: opaque identifiers
//! - [`Endpoints`]: HTTP and live-channel URLs derived from configuration
//!
//! Nothing here performs I/O.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod endpoint;
pub mod errors;
mod ids;
mod message;
mod room;

pub use endpoint::Endpoints;
pub use errors::{ProtocolError, Result};
pub use ids::{MessageId, RoomId};
pub use message::{Message, OutgoingMessage};
pub use room::{NewRoom, Room};
