//! Console rendering.
//!
//! The session hands over a full view on every render; the console only
//! prints what changed since the last one. Messages are printed as
//! `sender: content`. When the log no longer extends what was printed (a
//! history load replaced it) the whole log is printed again under a marker.
//! An empty state (no room selected, or a loaded room with no messages) gets
//! a one-line hint, once.

use std::io::{self, Write};

use parlor_app::SessionView;
use parlor_core::{ChannelState, Message, Room, RoomId};

use crate::command::HELP;

const NO_ROOM_HINT: &str = "Pick or create a room to start chatting.";
const EMPTY_ROOM_HINT: &str = "No messages yet. Say hello!";

/// Incremental printer for session views.
#[derive(Debug)]
pub struct Renderer<W> {
    out: W,
    rooms: Vec<Room>,
    room: Option<RoomId>,
    shown: Vec<Message>,
    channel: Option<ChannelState>,
    sender: Option<String>,
    hinted: bool,
}

impl<W: Write> Renderer<W> {
    /// Create a renderer writing to `out`.
    pub fn new(out: W) -> Self {
        Self {
            out,
            rooms: Vec::new(),
            room: None,
            shown: Vec::new(),
            channel: None,
            sender: None,
            hinted: false,
        }
    }

    /// Print what changed since the previous view.
    pub fn render(&mut self, view: &SessionView<'_>) -> io::Result<()> {
        if view.rooms != self.rooms.as_slice() {
            self.rooms = view.rooms.to_vec();
            self.list_rooms()?;
        }

        let room = view.current_room.map(|room| room.id.clone());
        if room != self.room {
            if let Some(current) = view.current_room {
                self.room_header(current)?;
            }
            self.room = room;
            self.shown.clear();
            self.channel = None;
            self.hinted = false;
        }

        self.render_messages(view.messages)?;
        self.render_hint(view)?;

        if self.room.is_some() && view.channel != self.channel {
            self.channel = view.channel;
            if let Some(status) = view.channel.and_then(channel_status) {
                writeln!(self.out, "[{status}]")?;
            }
        }

        match &self.sender {
            Some(sender) if sender == view.sender => {},
            Some(_) => {
                writeln!(self.out, "[sending as {}]", view.sender)?;
                self.sender = Some(view.sender.to_owned());
            },
            None => self.sender = Some(view.sender.to_owned()),
        }

        self.out.flush()
    }

    /// Print the last known room list.
    pub fn list_rooms(&mut self) -> io::Result<()> {
        if self.rooms.is_empty() {
            writeln!(self.out, "no rooms yet, /create one")?;
            return self.out.flush();
        }
        writeln!(self.out, "rooms:")?;
        for (index, room) in self.rooms.iter().enumerate() {
            match &room.description {
                Some(description) => {
                    writeln!(self.out, "  #{} {} - {description}", index + 1, room.name)?;
                },
                None => writeln!(self.out, "  #{} {}", index + 1, room.name)?,
            }
        }
        self.out.flush()
    }

    /// Print the command reference.
    pub fn help(&mut self) -> io::Result<()> {
        writeln!(self.out, "{HELP}")?;
        self.out.flush()
    }

    /// Print a one-line notice.
    pub fn notice(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.out, "[{text}]")?;
        self.out.flush()
    }

    /// Underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.out
    }

    fn room_header(&mut self, room: &Room) -> io::Result<()> {
        writeln!(self.out, "== {} ==", room.name)?;
        if let Some(description) = &room.description {
            writeln!(self.out, "   {description}")?;
        }
        Ok(())
    }

    /// Hint for an empty screen, printed at most once per room visit.
    fn render_hint(&mut self, view: &SessionView<'_>) -> io::Result<()> {
        if self.hinted {
            return Ok(());
        }
        let hint = match view.current_room {
            None => NO_ROOM_HINT,
            Some(_) if !view.messages.is_empty() => {
                self.hinted = true;
                return Ok(());
            },
            Some(_) if view.loading_history => return Ok(()),
            Some(_) => EMPTY_ROOM_HINT,
        };
        self.hinted = true;
        writeln!(self.out, "{hint}")
    }

    fn render_messages(&mut self, messages: &[Message]) -> io::Result<()> {
        let fresh = if messages.starts_with(&self.shown) {
            &messages[self.shown.len()..]
        } else {
            writeln!(self.out, "-- reloaded --")?;
            messages
        };
        for message in fresh {
            writeln!(self.out, "{}: {}", message.sender, message.content)?;
        }
        if !fresh.is_empty() || messages.len() != self.shown.len() {
            self.shown = messages.to_vec();
        }
        Ok(())
    }
}

fn channel_status(state: ChannelState) -> Option<&'static str> {
    match state {
        ChannelState::Connecting => Some("connecting"),
        ChannelState::Open => Some("live"),
        ChannelState::Idle => Some("connection lost, retrying"),
        ChannelState::Closed => Some("offline, /join the room again to reconnect"),
        ChannelState::Closing => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        rooms: Vec<Room>,
        messages: Vec<Message>,
        current: Option<usize>,
        channel: Option<ChannelState>,
        sender: &'static str,
        loading: bool,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                rooms: vec![
                    Room::new("1", "general").with_description("anything goes"),
                    Room::new("2", "random"),
                ],
                messages: Vec::new(),
                current: None,
                channel: None,
                sender: "Guest",
                loading: false,
            }
        }

        fn view(&self) -> SessionView<'_> {
            let current_room = self.current.map(|i| &self.rooms[i]);
            SessionView {
                rooms: &self.rooms,
                current_room,
                messages: &self.messages,
                channel: self.channel,
                channel_room: current_room.map(|room| &room.id),
                sender: self.sender,
                loading_history: self.loading,
            }
        }
    }

    fn output(renderer: &Renderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.get_ref().clone()).unwrap()
    }

    #[test]
    fn session_transcript() {
        let mut renderer = Renderer::new(Vec::new());
        let mut fixture = Fixture::new();
        renderer.render(&fixture.view()).unwrap();

        fixture.current = Some(0);
        fixture.channel = Some(ChannelState::Connecting);
        fixture.loading = true;
        renderer.render(&fixture.view()).unwrap();

        fixture.loading = false;
        fixture.messages.push(Message::new("1", "a", "hi"));
        renderer.render(&fixture.view()).unwrap();

        fixture.channel = Some(ChannelState::Open);
        fixture.messages.push(Message::new("2", "b", "yo"));
        renderer.render(&fixture.view()).unwrap();

        fixture.sender = "Ana";
        renderer.render(&fixture.view()).unwrap();

        fixture.current = Some(1);
        fixture.messages.clear();
        fixture.channel = Some(ChannelState::Connecting);
        fixture.loading = true;
        renderer.render(&fixture.view()).unwrap();

        insta::assert_snapshot!(output(&renderer), @r"
        rooms:
          #1 general - anything goes
          #2 random
        Pick or create a room to start chatting.
        == general ==
           anything goes
        [connecting]
        a: hi
        b: yo
        [live]
        [sending as Ana]
        == random ==
        [connecting]
        ");
    }

    #[test]
    fn replaced_log_is_reprinted() {
        let mut renderer = Renderer::new(Vec::new());
        let mut fixture = Fixture::new();
        fixture.current = Some(0);
        fixture.messages.push(Message::anonymous("a", "draft"));
        renderer.render(&fixture.view()).unwrap();

        fixture.messages = vec![Message::new("1", "a", "first"), Message::anonymous("a", "draft")];
        renderer.render(&fixture.view()).unwrap();

        insta::assert_snapshot!(output(&renderer), @r"
        rooms:
          #1 general - anything goes
          #2 random
        == general ==
           anything goes
        a: draft
        -- reloaded --
        a: first
        a: draft
        ");
    }

    #[test]
    fn lost_channel_is_announced() {
        let mut renderer = Renderer::new(Vec::new());
        let mut fixture = Fixture::new();
        fixture.current = Some(1);
        fixture.channel = Some(ChannelState::Open);
        renderer.render(&fixture.view()).unwrap();

        fixture.channel = Some(ChannelState::Idle);
        renderer.render(&fixture.view()).unwrap();
        fixture.channel = Some(ChannelState::Closed);
        renderer.render(&fixture.view()).unwrap();

        let text = output(&renderer);
        assert!(text.ends_with(
            "[live]\n[connection lost, retrying]\n[offline, /join the room again to reconnect]\n"
        ));
    }

    #[test]
    fn empty_states_are_hinted_once() {
        let mut renderer = Renderer::new(Vec::new());
        let mut fixture = Fixture::new();
        renderer.render(&fixture.view()).unwrap();
        renderer.render(&fixture.view()).unwrap();

        fixture.current = Some(1);
        fixture.loading = true;
        renderer.render(&fixture.view()).unwrap();
        fixture.loading = false;
        renderer.render(&fixture.view()).unwrap();
        renderer.render(&fixture.view()).unwrap();

        fixture.messages.push(Message::new("1", "a", "hello"));
        renderer.render(&fixture.view()).unwrap();

        insta::assert_snapshot!(output(&renderer), @r"
        rooms:
          #1 general - anything goes
          #2 random
        Pick or create a room to start chatting.
        == random ==
        No messages yet. Say hello!
        a: hello
        ");
    }

    #[test]
    fn empty_directory_hint() {
        let mut renderer = Renderer::new(Vec::new());
        renderer.list_rooms().unwrap();
        assert_eq!(output(&renderer), "no rooms yet, /create one\n");
    }
}
