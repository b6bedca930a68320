//! The production runtime loop, driven by the simulation driver.

use parlor_app::{Input, Intent, Runtime, Session};
use parlor_core::{ChannelState, ReconnectPolicy};
use parlor_harness::{InvariantRegistry, SimBackend, SimDriver, SimEnv, World};

fn world_with_history() -> parlor_harness::SharedWorld {
    let mut backend = SimBackend::new();
    let general = backend.seed_room("general");
    backend.seed_room("random");
    backend.seed_message(&general, "a", "hi");
    World::new(backend).into_shared()
}

fn runtime(
    world: &parlor_harness::SharedWorld,
    script: Vec<Input>,
) -> Runtime<SimDriver, SimEnv> {
    let driver = SimDriver::new(world.clone(), script)
        .with_invariants(InvariantRegistry::standard());
    let session = Session::new(SimEnv::with_seed(0), "tester", ReconnectPolicy::default());
    Runtime::new(driver, session)
}

#[tokio::test]
async fn join_send_and_quit() {
    let world = world_with_history();
    let mut runtime = runtime(&world, vec![
        Intent::JoinRoom("general".into()).into(),
        Intent::SendMessage("hello".into()).into(),
        Intent::Quit.into(),
    ]);

    runtime.run().await.unwrap();

    insta::assert_snapshot!(runtime.driver().screen().join("\n"), @r"
    a: hi
    tester: hello
    ");
    assert!(runtime.driver().is_stopped());
    assert_eq!(runtime.session().channels().state(), Some(ChannelState::Closing));
    assert!(World::lock(&world).connections().is_empty());
}

#[tokio::test]
async fn switching_rooms_replaces_screen() {
    let world = world_with_history();
    let mut runtime = runtime(&world, vec![
        Intent::JoinRoom("#1".into()).into(),
        Intent::JoinRoom("random".into()).into(),
        Intent::SendMessage("first in random".into()).into(),
    ]);

    runtime.run().await.unwrap();

    insta::assert_snapshot!(runtime.driver().screen().join("\n"), @"tester: first in random");
    let world = World::lock(&world);
    assert_eq!(world.transmissions().len(), 1);
    assert!(world.durable_writes().is_empty());
}

#[tokio::test]
async fn send_without_room_does_nothing() {
    let world = world_with_history();
    let mut runtime = runtime(&world, vec![Intent::SendMessage("hello".into()).into()]);

    runtime.run().await.unwrap();

    assert!(runtime.driver().screen().is_empty());
    let world = World::lock(&world);
    assert!(world.transmissions().is_empty());
    assert!(world.durable_writes().is_empty());
}

#[tokio::test]
async fn renders_are_batched_per_input() {
    let world = world_with_history();
    let mut runtime = runtime(&world, vec![Intent::JoinRoom("general".into()).into()]);

    runtime.run().await.unwrap();

    // Initial, directory, selection, history, channel open.
    assert_eq!(runtime.driver().renders(), 5);
}
