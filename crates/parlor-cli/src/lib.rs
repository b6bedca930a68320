//! Console front end for Parlor.
//!
//! A line-oriented client: typed lines become session intents, and each
//! render prints whatever changed since the last one. The session logic
//! lives in `parlor-app`; this crate only translates between it and a
//! terminal.
//!
//! # Components
//!
//! - [`ConsoleDriver`]: [`parlor_app::Driver`] over stdin, stdout and the
//!   network
//! - [`Renderer`]: incremental printer for session views
//! - [`command`]: input line parsing
//! - [`Args`]: command-line arguments

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod command;
pub mod driver;
pub mod error;
pub mod render;

pub use args::Args;
pub use driver::ConsoleDriver;
pub use error::ConsoleError;
pub use render::Renderer;
