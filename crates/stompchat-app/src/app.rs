//! Application state machine.
//!
//! This module defines the [`App`] state machine, which manages the interactive
//! state of the application completely decoupled from I/O and protocol
//! mechanics.
//!
//! This is a pure state machine: it consumes [`crate::AppEvent`] inputs and
//! produces [`crate::AppAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Knows who we are and where we connect to.
//! - Stores terminal dimensions to handle resize events.
//! - Holds the transient status message shown under the transcript.
//!
//! Connection status and the transcript belong to the session's
//! [`stompchat_client::ConnectionController`]; frontends read them from there.

use stompchat_client::{ConnectionStatus, Identity};

use crate::{AppAction, AppEvent};

/// Application state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable in simulation.
#[derive(Debug, Clone)]
pub struct App {
    /// Local display name.
    identity: Identity,
    /// Broker endpoint.
    endpoint: String,
    /// Terminal dimensions (columns, rows).
    terminal_size: (u16, u16),
    /// Transient status message. `None` if no message.
    status_message: Option<String>,
}

impl App {
    /// Create a new App for `identity` connecting to `endpoint`.
    pub fn new(identity: Identity, endpoint: String) -> Self {
        Self { identity, endpoint, terminal_size: (80, 24), status_message: None }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Tick => vec![],
            AppEvent::Resize(cols, rows) => {
                self.terminal_size = (cols, rows);
                vec![AppAction::Render]
            },
            AppEvent::StatusChanged { status } => {
                self.status_message = match status {
                    ConnectionStatus::Connecting => None,
                    ConnectionStatus::Connected => Some(format!("Joined as {}", self.identity)),
                    ConnectionStatus::Disconnected => {
                        Some("Disconnected. /reconnect to join again".to_string())
                    },
                    ConnectionStatus::FailedToConnect => {
                        Some(format!("Could not reach {}. /reconnect to retry", self.endpoint))
                    },
                };
                vec![AppAction::Render]
            },
            AppEvent::MessagesAppended { count } => {
                tracing::trace!(count, "records appended");
                vec![AppAction::Render]
            },
        }
    }

    /// Publish a chat line.
    ///
    /// Every submitted line is forwarded; the session decides whether it can
    /// be sent.
    pub fn send_message(&self, text: String) -> Vec<AppAction> {
        vec![AppAction::SendMessage { text }, AppAction::Render]
    }

    /// Start a new session.
    pub fn reconnect(&mut self) -> Vec<AppAction> {
        self.status_message = Some(format!("Reconnecting to {}...", self.endpoint));
        vec![AppAction::Reconnect, AppAction::Render]
    }

    /// Quit the application.
    pub fn quit(&self) -> Vec<AppAction> {
        vec![AppAction::Quit]
    }

    /// Local display name.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Broker endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Terminal dimensions (columns, rows).
    pub fn terminal_size(&self) -> (u16, u16) {
        self.terminal_size
    }

    /// Transient status message. `None` if no message.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }
}
