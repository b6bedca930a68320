//! HTTP backend: room directory, history and durable writes.
//!
//! A thin layer over `reqwest`. Every request is bounded by the configured
//! timeout so a fetch always completes or fails; the session never waits on
//! one indefinitely.

use parlor_proto::{Endpoints, Message, NewRoom, OutgoingMessage, Room, RoomId};
use reqwest::{Client, Response};
use tracing::debug;

use crate::{ClientConfig, TransportError};

/// Request/response client for the chat backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoints: Endpoints,
}

impl HttpBackend {
    /// Build a backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints do not resolve or the HTTP client
    /// cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, endpoints: config.endpoints()? })
    }

    /// Resolved endpoints.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// `GET /api/rooms`.
    pub async fn list_rooms(&self) -> Result<Vec<Room>, TransportError> {
        let url = self.endpoints.rooms()?;
        debug!(%url, "listing rooms");
        let response = checked(self.client.get(url).send().await?)?;
        Ok(response.json().await?)
    }

    /// `POST /api/rooms`.
    pub async fn create_room(&self, request: &NewRoom) -> Result<Room, TransportError> {
        let url = self.endpoints.rooms()?;
        debug!(%url, name = %request.name, "creating room");
        let response = checked(self.client.post(url).json(request).send().await?)?;
        Ok(response.json().await?)
    }

    /// `GET /api/rooms/{room}/messages`.
    pub async fn history(&self, room_id: &RoomId) -> Result<Vec<Message>, TransportError> {
        let url = self.endpoints.room_messages(room_id)?;
        debug!(%url, "fetching history");
        let response = checked(self.client.get(url).send().await?)?;
        Ok(response.json().await?)
    }

    /// `POST /api/rooms/{room}/messages`. The response body is ignored.
    pub async fn persist(
        &self,
        room_id: &RoomId,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        let url = self.endpoints.room_messages(room_id)?;
        debug!(%url, "persisting message");
        checked(self.client.post(url).json(message).send().await?)?;
        Ok(())
    }
}

fn checked(response: Response) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(TransportError::Status { url: response.url().to_string(), status: status.as_u16() })
}
