//! Console errors.

use std::io;

use parlor_client::TransportError;
use thiserror::Error;

/// Errors that end the console client.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Terminal input or output failed.
    #[error("console I/O error: {0}")]
    Io(#[from] io::Error),

    /// Network layer could not be set up.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
