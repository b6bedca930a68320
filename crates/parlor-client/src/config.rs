//! Client configuration.

use std::time::Duration;

use parlor_core::{ReconnectPolicy, transport::DEFAULT_SENDER};
use parlor_proto::Endpoints;

use crate::TransportError;

/// Origin used when nothing else is configured.
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";

/// Upper bound on a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin the client is served from. Used as the backend base when no
    /// override is set.
    pub origin: String,
    /// Backend base URL override.
    pub backend_url: Option<String>,
    /// Display name attached to sends.
    pub sender: String,
    /// Timeout applied to every HTTP request.
    pub request_timeout: Duration,
    /// Live channel reconnect policy.
    pub reconnect: ReconnectPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_owned(),
            backend_url: None,
            sender: DEFAULT_SENDER.to_owned(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Resolve HTTP and live-channel endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] if the effective base URL does not
    /// parse or uses a scheme other than `http`/`https`.
    pub fn endpoints(&self) -> Result<Endpoints, TransportError> {
        Ok(Endpoints::new(&self.origin, self.backend_url.as_deref())?)
    }
}

#[cfg(test)]
mod tests {
    use parlor_proto::RoomId;

    use super::*;

    #[test]
    fn defaults_point_at_local_origin() {
        let config = ClientConfig::default();
        let endpoints = config.endpoints().unwrap();

        assert_eq!(endpoints.rooms().unwrap().as_str(), "http://127.0.0.1:8000/api/rooms");
        assert_eq!(config.sender, "Guest");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn backend_override_drives_both_transports() {
        let config = ClientConfig {
            backend_url: Some("https://chat.example.com/base/".to_owned()),
            ..ClientConfig::default()
        };
        let endpoints = config.endpoints().unwrap();

        assert_eq!(
            endpoints.live_channel(&RoomId::new("7")).unwrap().as_str(),
            "wss://chat.example.com/base/ws/rooms/7"
        );
    }

    #[test]
    fn unsupported_scheme_is_config_error() {
        let config =
            ClientConfig { backend_url: Some("ftp://files".to_owned()), ..ClientConfig::default() };
        assert!(config.endpoints().unwrap_err().is_config());
    }
}
