//! Error types for wire decoding and endpoint construction.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding payloads or building endpoint URLs.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload was not the JSON shape we expected.
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload bytes were not valid UTF-8.
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    /// URL could not be parsed or extended.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// URL scheme is neither HTTP nor HTTPS.
    #[error("unsupported URL scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
}

impl ProtocolError {
    /// Returns true if this error came from a peer payload rather than from
    /// local configuration.
    ///
    /// Payload errors are dropped and logged; configuration errors stop
    /// startup.
    pub fn is_payload(&self) -> bool {
        matches!(self, Self::Json(_) | Self::NotUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_are_payload_errors() {
        let err = serde_json::from_str::<u8>("nope").unwrap_err();
        assert!(ProtocolError::from(err).is_payload());
        assert!(ProtocolError::NotUtf8.is_payload());
    }

    #[test]
    fn url_failures_are_configuration_errors() {
        assert!(!ProtocolError::UnsupportedScheme("ftp".into()).is_payload());
        assert!(
            !ProtocolError::InvalidUrl { url: "::".into(), reason: "empty host".into() }
                .is_payload()
        );
    }
}
