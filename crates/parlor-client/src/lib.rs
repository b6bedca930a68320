//! Production I/O for Parlor.
//!
//! Everything the session state machines need from the outside world:
//!
//! - [`HttpBackend`]: room directory, history and durable writes over HTTP
//! - [`LiveChannel`]: one WebSocket live channel in a background task
//! - [`Network`]: starts both kinds of I/O and queues their completions as
//!   session events
//! - [`SystemEnv`]: wall clock and OS randomness
//! - [`ClientConfig`]: origin, backend override, sender and timeouts

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod live;
pub mod network;
pub mod system_env;

pub use config::ClientConfig;
pub use error::TransportError;
pub use http::HttpBackend;
pub use live::LiveChannel;
pub use network::Network;
pub use system_env::SystemEnv;
