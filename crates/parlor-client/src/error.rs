//! Transport errors.

use parlor_proto::ProtocolError;
use thiserror::Error;

/// Errors from the HTTP backend and live channels.
///
/// None of these reach the session as errors: completions are reported as
/// failure events carrying the rendered message.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Endpoint configuration is unusable.
    #[error("configuration error: {0}")]
    Config(#[from] ProtocolError),

    /// HTTP request could not be completed.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("{url} returned {status}")]
    Status {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// Live channel failed to connect or broke.
    #[error("live channel error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

impl TransportError {
    /// Returns true if the failure is in local configuration rather than in
    /// the network or the backend.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
