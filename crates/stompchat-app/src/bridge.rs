//! Session-to-Application translation layer.
//!
//! The [`Bridge`] wraps one [`ConnectionController`] and its
//! [`StompSession`] and adapts them to the application lifecycle.
//!
//! # Responsibilities
//!
//! - Converts [`crate::AppAction`]s into controller operations.
//! - Converts [`TransportEvent`]s into controller events, via the STOMP
//!   session for frames.
//! - Encodes controller actions as frames and accumulates them to be sent by
//!   the driver in the next I/O cycle.
//! - Reports status and log changes back as [`crate::AppEvent`]s.
//! - Remembers when the controller asked for the transport to be released.
//!
//! One Bridge serves exactly one session. Reconnecting means a new Bridge.

use stompchat_client::{
    ClientConfig, ConnectionController, ConnectionStatus, ControllerAction, ControllerEvent,
    Identity, SessionError, StompSession, TransportEvent,
};
use stompchat_proto::Frame;

use crate::{AppAction, AppEvent};

/// Bridge between App and one broker session.
#[derive(Debug)]
pub struct Bridge {
    controller: ConnectionController,
    session: StompSession,
    outgoing: Vec<Frame>,
    release_requested: bool,
}

impl Bridge {
    /// Create a Bridge for a session that is about to connect.
    pub fn new(identity: Identity, config: ClientConfig) -> Self {
        Self {
            controller: ConnectionController::new(identity),
            session: StompSession::new(config),
            outgoing: Vec::new(),
            release_requested: false,
        }
    }

    /// Queue the `CONNECT` frame once the transport is up.
    pub fn open(&mut self) {
        let frame = self.session.connect_frame();
        self.outgoing.push(frame);
    }

    /// The transport could not be established.
    pub fn connect_failed(&mut self, reason: String) -> Vec<AppEvent> {
        self.handle_transport(TransportEvent::Error(reason))
    }

    /// Process an App action and return resulting App events.
    pub fn process_app_action(&mut self, action: AppAction) -> Vec<AppEvent> {
        match action {
            AppAction::SendMessage { text } => {
                let actions = self.controller.send(&text);
                self.execute(actions);
                vec![]
            },
            AppAction::Render | AppAction::Quit | AppAction::Reconnect => vec![],
        }
    }

    /// Handle a notification from the transport.
    pub fn handle_transport(&mut self, event: TransportEvent) -> Vec<AppEvent> {
        match event {
            TransportEvent::Frame(frame) => match self.session.handle_frame(frame) {
                Ok(Some(event)) => self.dispatch(event),
                Ok(None) => vec![],
                Err(e) => self.session_error(&e),
            },
            TransportEvent::Malformed(e) => self.session_error(&SessionError::Protocol(e)),
            TransportEvent::Closed => {
                self.session.transport_lost();
                self.dispatch(ControllerEvent::TransportClosed)
            },
            TransportEvent::Error(reason) => {
                self.session.transport_lost();
                self.dispatch(ControllerEvent::TransportError { reason })
            },
        }
    }

    /// Retire the session.
    ///
    /// Queues the departure announcement (if connected) and the `DISCONNECT`
    /// frame, then flags the transport for release. Idempotent.
    pub fn teardown(&mut self) -> Vec<AppEvent> {
        let before = self.snapshot();
        let actions = self.controller.teardown();
        self.execute(actions);
        self.changes_since(before)
    }

    /// Take pending outgoing frames.
    pub fn take_outgoing(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.outgoing)
    }

    /// Whether the controller asked for the transport to be released.
    ///
    /// Returns `true` once; the flag is cleared by this call.
    pub fn take_release(&mut self) -> bool {
        std::mem::take(&mut self.release_requested)
    }

    /// Session controller (status and log).
    pub fn controller(&self) -> &ConnectionController {
        &self.controller
    }

    /// STOMP session state.
    pub fn session(&self) -> &StompSession {
        &self.session
    }

    fn dispatch(&mut self, event: ControllerEvent) -> Vec<AppEvent> {
        let before = self.snapshot();
        let actions = self.controller.handle(event);
        self.execute(actions);
        self.changes_since(before)
    }

    /// Broker-level problems are diagnostics only.
    fn session_error(&mut self, error: &SessionError) -> Vec<AppEvent> {
        self.dispatch(ControllerEvent::BrokerError {
            message: "invalid frame from broker".to_string(),
            details: error.to_string(),
        })
    }

    fn execute(&mut self, actions: Vec<ControllerAction>) {
        for action in actions {
            if action == ControllerAction::Close {
                self.release_requested = true;
            }
            match self.session.encode_action(&action) {
                Ok(Some(frame)) => self.outgoing.push(frame),
                Ok(None) => {},
                Err(e) => tracing::warn!(error = %e, ?action, "dropping controller action"),
            }
        }
    }

    fn snapshot(&self) -> (ConnectionStatus, usize) {
        (self.controller.status(), self.controller.log().len())
    }

    fn changes_since(&self, (status, len): (ConnectionStatus, usize)) -> Vec<AppEvent> {
        let mut events = Vec::new();
        if self.controller.status() != status {
            events.push(AppEvent::StatusChanged { status: self.controller.status() });
        }
        let appended = self.controller.log().len().saturating_sub(len);
        if appended > 0 {
            events.push(AppEvent::MessagesAppended { count: appended });
        }
        events
    }
}
