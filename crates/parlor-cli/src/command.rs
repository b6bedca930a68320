//! Console command parsing.
//!
//! Lines starting with `/` are commands; anything else is a message. A
//! leading `//` sends the rest of the line literally, slash included.

use parlor_app::Intent;

/// Help text listing every command.
pub const HELP: &str = "\
commands:
  /rooms                         list rooms
  /join <name|#index|id>         switch to a room
  /create <name> [| description] create a room and switch to it
  /nick <name>                   change your display name
  /help                          show this help
  /quit                          leave
anything else is sent to the current room";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Hand to the session.
    Intent(Intent),
    /// Print the room list.
    ListRooms,
    /// Print [`HELP`].
    Help,
    /// Command used without its required argument.
    Usage(&'static str),
    /// Unrecognized command name.
    Unknown(String),
    /// Blank line.
    Empty,
}

/// Parse one input line.
pub fn parse(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Command::Empty;
    }

    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return Command::Intent(Intent::SendMessage(line.to_owned()));
    };
    if rest.starts_with('/') {
        return Command::Intent(Intent::SendMessage(rest.to_owned()));
    }

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "rooms" | "r" => Command::ListRooms,
        "join" | "j" if arg.is_empty() => Command::Usage("/join <name|#index|id>"),
        "join" | "j" => Command::Intent(Intent::JoinRoom(arg.to_owned())),
        "create" if arg.is_empty() => Command::Usage("/create <name> [| description]"),
        "create" => {
            let (name, description) = match arg.split_once('|') {
                Some((name, description)) => (name, Some(description.trim().to_owned())),
                None => (arg, None),
            };
            Command::Intent(Intent::CreateRoom { name: name.trim().to_owned(), description })
        },
        "nick" => Command::Intent(Intent::SetSender(arg.to_owned())),
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Intent(Intent::Quit),
        other => Command::Unknown(other.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_are_messages() {
        let expected = Command::Intent(Intent::SendMessage("hello there".into()));
        assert_eq!(parse("hello there\n"), expected);
    }

    #[test]
    fn double_slash_escapes() {
        assert_eq!(parse("//shrug"), Command::Intent(Intent::SendMessage("/shrug".into())));
    }

    #[test]
    fn join_takes_rest_of_line() {
        let expected = Command::Intent(Intent::JoinRoom("the lounge".into()));
        assert_eq!(parse("/join  the lounge "), expected);
        assert_eq!(parse("/j #2"), Command::Intent(Intent::JoinRoom("#2".into())));
        assert!(matches!(parse("/join"), Command::Usage(_)));
    }

    #[test]
    fn create_splits_description() {
        assert_eq!(
            parse("/create general | all things"),
            Command::Intent(Intent::CreateRoom {
                name: "general".into(),
                description: Some("all things".into()),
            })
        );
        assert_eq!(
            parse("/create general"),
            Command::Intent(Intent::CreateRoom { name: "general".into(), description: None })
        );
    }

    #[test]
    fn local_commands() {
        assert_eq!(parse("/rooms"), Command::ListRooms);
        assert_eq!(parse("/help"), Command::Help);
        assert_eq!(parse("/quit"), Command::Intent(Intent::Quit));
        assert_eq!(parse("/nick Ana"), Command::Intent(Intent::SetSender("Ana".into())));
        assert_eq!(parse("/frobnicate x"), Command::Unknown("frobnicate".into()));
        assert_eq!(parse("   "), Command::Empty);
    }

    #[test]
    fn help_snapshot() {
        insta::assert_snapshot!(HELP, @r"
        commands:
          /rooms                         list rooms
          /join <name|#index|id>         switch to a room
          /create <name> [| description] create a room and switch to it
          /nick <name>                   change your display name
          /help                          show this help
          /quit                          leave
        anything else is sent to the current room
        ");
    }
}
