//! Endpoint layout.
//!
//! | Operation            | Method | Path                          |
//! |----------------------|--------|-------------------------------|
//! | list rooms           | GET    | `/api/rooms`                  |
//! | create room          | POST   | `/api/rooms`                  |
//! | room history         | GET    | `/api/rooms/{room}/messages`  |
//! | durable message post | POST   | `/api/rooms/{room}/messages`  |
//! | live channel         | WS     | `/ws/rooms/{room}`            |
//!
//! All paths hang off a single base. The base is the configured backend URL
//! if there is one, otherwise the client's own origin. The live channel uses
//! the same base with its scheme translated to `ws`/`wss`.

use url::Url;

use crate::{ProtocolError, Result, RoomId};

/// Resolved HTTP and live-channel base URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    http: Url,
    live: Url,
}

impl Endpoints {
    /// Resolve endpoints from the client origin and an optional backend
    /// override.
    ///
    /// The chosen base must be an `http` or `https` URL. A trailing slash is
    /// ignored; any path prefix is kept.
    pub fn new(origin: &str, backend_url: Option<&str>) -> Result<Self> {
        let raw = backend_url.map(str::trim).filter(|u| !u.is_empty()).unwrap_or(origin);
        let http = Url::parse(raw)
            .map_err(|e| ProtocolError::InvalidUrl { url: raw.to_owned(), reason: e.to_string() })?;

        let live_scheme = match http.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(ProtocolError::UnsupportedScheme(other.to_owned())),
        };

        if http.cannot_be_a_base() {
            return Err(ProtocolError::InvalidUrl {
                url: raw.to_owned(),
                reason: "URL cannot carry a path".to_owned(),
            });
        }

        let mut live = http.clone();
        live.set_scheme(live_scheme).map_err(|()| ProtocolError::InvalidUrl {
            url: raw.to_owned(),
            reason: format!("cannot switch scheme to {live_scheme}"),
        })?;

        Ok(Self { http, live })
    }

    /// `GET`/`POST /api/rooms`.
    pub fn rooms(&self) -> Result<Url> {
        join(&self.http, &["api", "rooms"])
    }

    /// `GET`/`POST /api/rooms/{room}/messages`.
    pub fn room_messages(&self, room_id: &RoomId) -> Result<Url> {
        join(&self.http, &["api", "rooms", room_id.as_str(), "messages"])
    }

    /// `/ws/rooms/{room}` on the live-channel scheme.
    pub fn live_channel(&self, room_id: &RoomId) -> Result<Url> {
        join(&self.live, &["ws", "rooms", room_id.as_str()])
    }

    /// HTTP base URL.
    pub fn http_base(&self) -> &Url {
        &self.http
    }

    /// Live-channel base URL.
    pub fn live_base(&self) -> &Url {
        &self.live
    }
}

/// Append path segments, percent-encoding each one.
fn join(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| ProtocolError::InvalidUrl {
            url: base.to_string(),
            reason: "URL cannot carry a path".to_owned(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
