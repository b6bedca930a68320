//! Application layer for Parlor
//!
//! The session controller and a generic runtime around it. The controller is
//! a pure state machine; the runtime pumps inputs from a [`Driver`] into it
//! and hands the resulting actions back to the driver, so the same
//! orchestration runs in the console client and in simulation.
//!
//! # Components
//!
//! - [`Session`]: selection, history loading, live channel and send routing
//! - [`SessionEvent`] / [`SessionAction`]: I/O completions in, I/O requests out
//! - [`Intent`]: user requests
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic orchestration loop using Driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod driver;
mod event;
mod input;
mod runtime;
mod session;
mod view;

pub use action::{FetchTicket, SessionAction};
pub use driver::Driver;
pub use event::SessionEvent;
pub use input::{Input, Intent};
pub use runtime::Runtime;
pub use session::Session;
pub use view::SessionView;
