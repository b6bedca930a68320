//! Property-based tests for the Session state machine.
//!
//! Feeds the session arbitrary (often nonsensical) events and intents
//! without any backend behind it, and checks that its bookkeeping stays
//! consistent.

use parlor_app::{FetchTicket, Intent, Session, SessionAction, SessionEvent};
use parlor_core::{ChannelId, ChannelState, ReconnectPolicy, Room, RoomId};
use parlor_harness::SimEnv;
use proptest::prelude::*;

fn room_id() -> impl Strategy<Value = RoomId> {
    (0u8..4).prop_map(|n| RoomId::new(n.to_string()))
}

fn channel_id() -> impl Strategy<Value = ChannelId> {
    (1u64..6).prop_map(ChannelId::new)
}

fn payload() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u8..20, "[a-z]{1,6}")
            .prop_map(|(id, text)| format!(r#"{{"id":{id},"sender":"x","content":"{text}"}}"#)),
        "[a-z]{1,6}".prop_map(|text| format!(r#"{{"sender":"x","content":"{text}"}}"#)),
        Just("{".to_owned()),
    ]
}

fn input_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => room_id().prop_map(Step::Select),
        1 => "[ a-z]{0,6}".prop_map(Step::Send),
        1 => Just(Step::Tick),
        2 => channel_id().prop_map(Step::Opened),
        4 => (channel_id(), payload()).prop_map(|(channel, payload)| Step::Frame(channel, payload)),
        2 => channel_id().prop_map(Step::Closed),
        2 => (room_id(), 0u64..8).prop_map(|(room, selection)| Step::History(room, selection)),
    ]
}

#[derive(Debug, Clone)]
enum Step {
    Select(RoomId),
    Send(String),
    Tick,
    Opened(ChannelId),
    Frame(ChannelId, String),
    Closed(ChannelId),
    History(RoomId, u64),
}

fn session() -> Session<SimEnv> {
    let mut session = Session::new(SimEnv::with_seed(0), "tester", ReconnectPolicy::default());
    let rooms = (0..3).map(|n| Room::new(n.to_string(), format!("room {n}"))).collect();
    session.handle(SessionEvent::RoomsLoaded { rooms });
    session
}

fn run(session: &mut Session<SimEnv>, step: Step) -> Vec<SessionAction> {
    match step {
        Step::Select(room_id) => session.apply(Intent::SelectRoom(room_id)),
        Step::Send(text) => session.apply(Intent::SendMessage(text)),
        Step::Tick => session.handle(SessionEvent::Tick),
        Step::Opened(channel) => session.handle(SessionEvent::ChannelOpened { channel }),
        Step::Frame(channel, payload) => {
            session.handle(SessionEvent::ChannelFrame { channel, payload })
        },
        Step::Closed(channel) => {
            session.handle(SessionEvent::ChannelClosed { channel, reason: None })
        },
        Step::History(room_id, selection) => session.handle(SessionEvent::HistoryLoaded {
            ticket: FetchTicket { room_id, selection },
            messages: vec![],
        }),
    }
}

proptest! {
    /// The channel is only ever bound to the selected room, and every
    /// message in the log is unique by id.
    #[test]
    fn prop_bookkeeping_is_consistent(steps in prop::collection::vec(input_strategy(), 0..60)) {
        let mut session = session();
        for step in steps {
            run(&mut session, step);

            let view = session.view();
            if let Some(channel_room) = view.channel_room
                && view.channel != Some(ChannelState::Closed)
            {
                prop_assert_eq!(Some(channel_room), session.current_room());
            }
            if session.current_room().is_none() {
                prop_assert!(view.messages.is_empty());
            }
            let mut ids: Vec<_> = view.messages.iter().filter_map(|m| m.id.clone()).collect();
            let total = ids.len();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), total);
        }
    }

    /// Every selection issues a ticket newer than any before it.
    #[test]
    fn prop_tickets_increase(rooms in prop::collection::vec(room_id(), 1..20)) {
        let mut session = session();
        let mut last = 0;
        for room_id in rooms {
            for action in session.apply(Intent::SelectRoom(room_id)) {
                if let SessionAction::FetchHistory { ticket } = action {
                    prop_assert!(ticket.selection > last);
                    last = ticket.selection;
                }
            }
        }
    }

    /// Each action batch opens at most one channel.
    #[test]
    fn prop_at_most_one_open_per_batch(steps in prop::collection::vec(input_strategy(), 0..60)) {
        let mut session = session();
        for step in steps {
            let opens = run(&mut session, step)
                .iter()
                .filter(|a| matches!(a, SessionAction::OpenChannel { .. }))
                .count();
            prop_assert!(opens <= 1);
        }
    }
}
