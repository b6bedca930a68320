//! Console driver implementing the Driver trait.
//!
//! Merges three input sources into one stream for the runtime: network
//! completions, typed lines, and a periodic tick that lets the session fire
//! due reconnects. Commands that only read local state (`/rooms`, `/help`)
//! are answered here without involving the session.

use std::{io::Write, time::Duration};

use parlor_app::{Driver, FetchTicket, Input, SessionEvent, SessionView};
use parlor_client::{Network, network::CLOSE_GRACE};
use parlor_core::{ChannelId, ChannelTag, NewRoom, OutgoingMessage, RoomId};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, Lines},
    time::{Interval, MissedTickBehavior},
};

use crate::{
    ConsoleError, Renderer,
    command::{self, Command},
};

/// How often the session is ticked.
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Line-oriented console driver.
pub struct ConsoleDriver<R, W> {
    network: Network,
    lines: Lines<R>,
    renderer: Renderer<W>,
    tick: Interval,
}

impl<R, W> ConsoleDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Create a driver reading lines from `input` and printing to `output`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(network: Network, input: R, output: W) -> Self {
        let mut tick = tokio::time::interval(TICK_INTERVAL);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { network, lines: input.lines(), renderer: Renderer::new(output), tick }
    }

    /// Renderer state and output.
    pub fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    /// Handle a line locally, or return the session input it maps to.
    fn on_line(&mut self, line: &str) -> Result<Option<Input>, ConsoleError> {
        match command::parse(line) {
            Command::Intent(intent) => return Ok(Some(intent.into())),
            Command::ListRooms => self.renderer.list_rooms()?,
            Command::Help => self.renderer.help()?,
            Command::Usage(usage) => self.renderer.notice(&format!("usage: {usage}"))?,
            Command::Unknown(name) => {
                self.renderer.notice(&format!("unknown command /{name}, try /help"))?;
            },
            Command::Empty => {},
        }
        Ok(None)
    }
}

impl<R, W> Driver for ConsoleDriver<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    type Error = ConsoleError;

    async fn poll_event(&mut self) -> Result<Option<Input>, Self::Error> {
        loop {
            tokio::select! {
                Some(event) = self.network.next_event() => return Ok(Some(event.into())),
                line = self.lines.next_line() => {
                    let Some(line) = line? else {
                        return Ok(None);
                    };
                    if let Some(input) = self.on_line(&line)? {
                        return Ok(Some(input));
                    }
                },
                _ = self.tick.tick() => return Ok(Some(SessionEvent::Tick.into())),
            }
        }
    }

    fn fetch_rooms(&mut self) {
        self.network.fetch_rooms();
    }

    fn fetch_history(&mut self, ticket: FetchTicket) {
        self.network.fetch_history(ticket);
    }

    fn create_room(&mut self, request: NewRoom) {
        self.network.create_room(request);
    }

    fn persist_message(&mut self, room_id: RoomId, message: OutgoingMessage) {
        self.network.persist_message(room_id, message);
    }

    fn open_channel(&mut self, channel: ChannelTag) {
        self.network.open_channel(channel);
    }

    fn transmit(&mut self, channel: ChannelTag, message: OutgoingMessage) {
        self.network.transmit(channel, message);
    }

    fn close_channel(&mut self, channel: ChannelId) {
        self.network.close_channel(channel);
    }

    fn render(&mut self, view: &SessionView<'_>) -> Result<(), Self::Error> {
        Ok(self.renderer.render(view)?)
    }

    async fn stop(&mut self) {
        self.network.shutdown(CLOSE_GRACE).await;
    }
}

#[cfg(test)]
mod tests {
    use parlor_app::Intent;
    use parlor_client::ClientConfig;

    use super::*;

    fn driver(input: &'static str) -> ConsoleDriver<&'static [u8], Vec<u8>> {
        let config = ClientConfig {
            backend_url: Some("http://127.0.0.1:9".to_owned()),
            ..ClientConfig::default()
        };
        let network = Network::new(&config).unwrap();
        ConsoleDriver::new(network, input.as_bytes(), Vec::new())
    }

    async fn next_non_tick(driver: &mut ConsoleDriver<&'static [u8], Vec<u8>>) -> Option<Input> {
        loop {
            match driver.poll_event().await.unwrap() {
                Some(Input::Session(SessionEvent::Tick)) => {},
                other => return other,
            }
        }
    }

    #[tokio::test]
    async fn lines_become_intents_and_local_commands_print() {
        let mut driver = driver("/help\nhello\n/nope\n/join general\n");

        let first = next_non_tick(&mut driver).await;
        assert!(matches!(first, Some(Input::Intent(Intent::SendMessage(ref t))) if t == "hello"));

        let second = next_non_tick(&mut driver).await;
        assert!(matches!(second, Some(Input::Intent(Intent::JoinRoom(ref q))) if q == "general"));

        assert!(next_non_tick(&mut driver).await.is_none());

        let printed = String::from_utf8(driver.renderer().get_ref().clone()).unwrap();
        assert!(printed.starts_with("commands:"));
        assert!(printed.ends_with("[unknown command /nope, try /help]\n"));
    }
}
