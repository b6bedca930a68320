//! Generic runtime for session orchestration.
//!
//! The Runtime drives the event loop, coordinating between:
//! - [`Session`]: session controller state machine
//! - [`Driver`]: platform-specific I/O

use parlor_core::Environment;

use crate::{Driver, Input, Intent, Session, SessionAction};

/// Generic runtime that orchestrates a Session and a Driver.
///
/// # Type Parameters
///
/// - `D`: Platform-specific I/O driver
/// - `E`: Environment supplying time and randomness to the session
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    session: Session<E>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a runtime around a driver and a fresh session.
    pub fn new(driver: D, session: Session<E>) -> Self {
        Self { driver, session }
    }

    /// Run the main event loop.
    ///
    /// 1. Requests the room directory and renders the empty session
    /// 2. Feeds each input from the driver into the session
    /// 3. Executes the resulting actions through the driver
    ///
    /// Stops on [`Intent::Quit`] or when the driver runs out of input, then
    /// releases the live channel and stops the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters an I/O error.
    pub async fn run(&mut self) -> Result<(), D::Error> {
        let actions = self.session.load_rooms();
        self.execute(actions)?;
        self.driver.render(&self.session.view())?;

        while let Some(input) = self.driver.poll_event().await? {
            if self.process(input)? {
                break;
            }
        }

        let actions = self.session.shutdown();
        self.execute(actions)?;
        self.driver.stop().await;
        Ok(())
    }

    /// Process one input.
    ///
    /// Returns `true` if the session should end.
    pub fn process(&mut self, input: Input) -> Result<bool, D::Error> {
        let actions = match input {
            Input::Intent(Intent::Quit) => return Ok(true),
            Input::Intent(intent) => self.session.apply(intent),
            Input::Session(event) => self.session.handle(event),
        };
        self.execute(actions)?;
        Ok(false)
    }

    /// Hand actions to the driver. Renders at most once per batch, after
    /// every request has been started.
    fn execute(&mut self, actions: Vec<SessionAction>) -> Result<(), D::Error> {
        let mut render = false;
        for action in actions {
            match action {
                SessionAction::Render => render = true,
                SessionAction::FetchRooms => self.driver.fetch_rooms(),
                SessionAction::FetchHistory { ticket } => self.driver.fetch_history(ticket),
                SessionAction::CreateRoom { request } => self.driver.create_room(request),
                SessionAction::OpenChannel { channel } => self.driver.open_channel(channel),
                SessionAction::CloseChannel { channel } => self.driver.close_channel(channel),
                SessionAction::Transmit { channel, message } => {
                    self.driver.transmit(channel, message);
                },
                SessionAction::PersistMessage { room_id, message } => {
                    self.driver.persist_message(room_id, message);
                },
            }
        }

        if render {
            self.driver.render(&self.session.view())?;
        }
        Ok(())
    }

    /// Get a reference to the Session
    pub fn session(&self) -> &Session<E> {
        &self.session
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Get a mutable reference to the Driver
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }
}
