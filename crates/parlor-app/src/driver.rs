//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the session runtime from specific I/O
//! implementations. Each front end implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::future::Future;

use parlor_core::{ChannelId, ChannelTag, NewRoom, OutgoingMessage, RoomId};

use crate::{FetchTicket, Input, SessionView};

/// Abstracts I/O operations for the session runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in the console client and simulation.
///
/// Request methods only start work. They must not block; each completion or
/// failure comes back later as a [`crate::SessionEvent`] from
/// [`Driver::poll_event`].
///
/// # Implementations
///
/// - **Console**: stdin lines for intents, reqwest and tokio-tungstenite
///   tasks for I/O
/// - **Simulation**: in-memory backend with controllable delivery order
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next input.
    ///
    /// Returns `None` once the input source is exhausted.
    fn poll_event(&mut self) -> impl Future<Output = Result<Option<Input>, Self::Error>> + Send;

    /// Start loading the room directory.
    fn fetch_rooms(&mut self);

    /// Start loading a room's history. The ticket is echoed back.
    fn fetch_history(&mut self, ticket: FetchTicket);

    /// Start creating a room.
    fn create_room(&mut self, request: NewRoom);

    /// Start a durable write of a message.
    fn persist_message(&mut self, room_id: RoomId, message: OutgoingMessage);

    /// Start connecting a live channel.
    fn open_channel(&mut self, channel: ChannelTag);

    /// Queue a message on a live channel.
    ///
    /// If the channel is already gone, report
    /// [`crate::SessionEvent::TransmitFailed`].
    fn transmit(&mut self, channel: ChannelTag, message: OutgoingMessage);

    /// Start tearing down a live channel. Unknown ids are ignored.
    fn close_channel(&mut self, channel: ChannelId);

    /// Render the session state.
    ///
    /// # Errors
    ///
    /// Returns an error if the output surface fails.
    fn render(&mut self, view: &SessionView<'_>) -> Result<(), Self::Error>;

    /// Finish any teardown started by [`Driver::close_channel`], then abort
    /// remaining I/O and release resources.
    ///
    /// Implementations should bound how long this waits.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}
