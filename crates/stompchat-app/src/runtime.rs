//! Generic runtime for application orchestration.
//!
//! The Runtime drives the application event loop, coordinating between:
//! - [`App`]: UI state machine
//! - [`Bridge`]: Session bridge to the connection controller
//! - [`Driver`]: Platform-specific I/O
//!
//! Sessions never overlap: a session is torn down completely (frames
//! flushed, transport released) before the next one connects.

use stompchat_client::{ClientConfig, ConnectionController, ConnectionStatus, Identity, TransportEvent};

use crate::{App, AppAction, AppEvent, Bridge, Driver};

/// Generic runtime that orchestrates App, Bridge, and Driver.
pub struct Runtime<D: Driver> {
    driver: D,
    app: App,
    bridge: Bridge,
    config: ClientConfig,
}

impl<D: Driver> Runtime<D> {
    /// Create a new runtime for `identity` with the given driver.
    pub fn new(driver: D, identity: Identity, config: ClientConfig) -> Self {
        let app = App::new(identity.clone(), config.endpoint.clone());
        let bridge = Bridge::new(identity, config.clone());
        Self { driver, app, bridge, config }
    }

    /// Run the main event loop until the user quits.
    ///
    /// Network failures never end the loop; they show up as status changes.
    /// The session is torn down on every exit, including a driver error.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver encounters a local I/O error.
    pub async fn run(mut self) -> Result<(), D::Error> {
        if let Err(e) = self.event_loop().await {
            tracing::error!(error = %e, "event loop failed, tearing down session");
            // Rendering may be what failed, so only the session is retired
            let _ = self.end_session().await;
            return Err(e);
        }

        self.shutdown().await
    }

    async fn event_loop(&mut self) -> Result<(), D::Error> {
        self.start().await?;
        while !self.step().await? {}
        Ok(())
    }

    /// Render once and open the first session.
    pub async fn start(&mut self) -> Result<(), D::Error> {
        self.render()?;
        let events = self.start_session().await;
        self.process_app_events(events).await?;
        Ok(())
    }

    /// Process one cycle of the event loop.
    ///
    /// This is the core orchestration cycle that:
    /// 1. Polls for input from the driver
    /// 2. Drains pending transport notifications
    /// 3. Processes actions and events between App and Bridge
    /// 4. Sends outgoing frames through the driver
    ///
    /// Returns `true` if the application should quit.
    pub async fn step(&mut self) -> Result<bool, D::Error> {
        let actions = self.driver.poll_event(&mut self.app).await?;
        if !actions.is_empty() && self.process_actions(actions).await? {
            return Ok(true);
        }

        while self.driver.is_connected()
            && let Some(event) = self.driver.recv_event().await
        {
            let mut events = self.bridge.handle_transport(event);
            events.extend(self.flush().await);
            if self.process_app_events(events).await? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Tear down the current session and render the final state.
    pub async fn shutdown(&mut self) -> Result<(), D::Error> {
        let events = self.end_session().await;
        self.process_app_events(events).await?;
        self.render()
    }

    /// Process actions returned by the App.
    ///
    /// Returns `true` if should quit.
    async fn process_actions(&mut self, initial_actions: Vec<AppAction>) -> Result<bool, D::Error> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                let events = match action {
                    AppAction::Render => {
                        self.render()?;
                        continue;
                    },
                    AppAction::Quit => return Ok(true),
                    AppAction::Reconnect => self.reconnect().await,
                    AppAction::SendMessage { .. } => {
                        let mut events = self.bridge.process_app_action(action);
                        events.extend(self.flush().await);
                        events
                    },
                };

                for event in events {
                    pending_actions.extend(self.app.handle(event));
                }
            }
        }
        Ok(false)
    }

    /// Feed Bridge events to the App and run the resulting actions.
    async fn process_app_events(&mut self, events: Vec<AppEvent>) -> Result<bool, D::Error> {
        let actions: Vec<_> = events.into_iter().flat_map(|event| self.app.handle(event)).collect();
        self.process_actions(actions).await
    }

    /// Connect the transport and send the handshake.
    ///
    /// A failed connect is a status change, not an error.
    async fn start_session(&mut self) -> Vec<AppEvent> {
        let mut events = vec![AppEvent::StatusChanged { status: ConnectionStatus::Connecting }];

        match self.driver.connect(&self.config.endpoint).await {
            Ok(()) => {
                tracing::info!(endpoint = %self.config.endpoint, "transport connected");
                self.bridge.open();
                events.extend(self.flush().await);
            },
            Err(e) => {
                tracing::error!(endpoint = %self.config.endpoint, error = %e, "connect failed");
                events.extend(self.bridge.connect_failed(e.to_string()));
            },
        }
        events
    }

    /// Tear down the session, flush its last frames and release the
    /// transport if the controller asked for it.
    async fn end_session(&mut self) -> Vec<AppEvent> {
        let mut events = self.bridge.teardown();
        events.extend(self.flush().await);

        if self.bridge.take_release() {
            self.driver.close().await;
            tracing::debug!("transport released");
        }
        events
    }

    async fn reconnect(&mut self) -> Vec<AppEvent> {
        let mut events = self.end_session().await;
        self.bridge = Bridge::new(self.app.identity().clone(), self.config.clone());
        events.extend(self.start_session().await);
        events
    }

    /// Send all pending outgoing frames to the broker.
    ///
    /// A failed send is reported to the session as a transport error and the
    /// remaining frames are dropped.
    async fn flush(&mut self) -> Vec<AppEvent> {
        for frame in self.bridge.take_outgoing() {
            if let Err(e) = self.driver.send_frame(frame).await {
                tracing::warn!(error = %e, "failed to send frame");
                return self.bridge.handle_transport(TransportEvent::Error(e.to_string()));
            }
        }
        vec![]
    }

    fn render(&mut self) -> Result<(), D::Error> {
        self.driver.render(&self.app, self.bridge.controller())
    }

    /// Get a reference to the App
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Get a mutable reference to the App
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// Current session controller.
    pub fn controller(&self) -> &ConnectionController {
        self.bridge.controller()
    }

    /// Get a reference to the Driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
