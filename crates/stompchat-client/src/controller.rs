//! Connection lifecycle state machine.
//!
//! Owns one broker session: its status, its message log and the single
//! outbound send operation. Uses the action pattern: lifecycle notifications
//! go in as [`ControllerEvent`]s and side effects come out as
//! [`ControllerAction`]s for the caller to execute. No I/O happens here.
//!
//! # State Machine
//!
//! ```text
//!                 handshake              teardown / close
//! ┌────────────┐ ──────────> ┌───────────┐ ──────────> ┌──────────────┐
//! │ Connecting │             │ Connected │             │ Disconnected │
//! └────────────┘             └───────────┘             └──────────────┘
//!       │                          │
//!       │ transport error          │ transport error
//!       ↓                          ↓
//! ┌─────────────────────────────────────┐
//! │           FailedToConnect           │
//! └─────────────────────────────────────┘
//! ```
//!
//! A transport close moves any state to `Disconnected`. Broker errors never
//! change the status. A new session starts over with a new controller.

use std::fmt;

use stompchat_proto::ChatMessage;

use crate::{Channel, ControllerAction, ControllerEvent, Identity, MessageLog};

/// Connection status as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// Handshake in progress (initial state).
    Connecting,
    /// Handshake completed and broadcast subscription active.
    Connected,
    /// Session closed, by us or by the transport.
    Disconnected,
    /// Transport failed.
    FailedToConnect,
}

impl ConnectionStatus {
    /// User-visible label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting...",
            Self::Connected => "Connected",
            Self::Disconnected => "Disconnected",
            Self::FailedToConnect => "Failed to connect",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle controller for one broker session.
///
/// The inbound-record handler is the only writer of the log, and lifecycle
/// handlers are the only writers of the status. Both are exposed read-only.
#[derive(Debug, Clone)]
pub struct ConnectionController {
    identity: Identity,
    status: ConnectionStatus,
    log: MessageLog,
    /// Set once teardown ran; the transport handle is released.
    released: bool,
}

impl ConnectionController {
    /// Create a controller for a session that is about to connect.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            status: ConnectionStatus::Connecting,
            log: MessageLog::new(),
            released: false,
        }
    }

    /// Process a lifecycle notification and return actions.
    ///
    /// Never fails: every failure path ends up as a status change or a log
    /// line.
    pub fn handle(&mut self, event: ControllerEvent) -> Vec<ControllerAction> {
        match event {
            ControllerEvent::HandshakeComplete => self.on_handshake(),
            ControllerEvent::MessageReceived(message) => {
                self.on_message(message);
                vec![]
            },
            ControllerEvent::TransportClosed => {
                tracing::info!(previous = %self.status, "transport closed");
                self.status = ConnectionStatus::Disconnected;
                vec![]
            },
            ControllerEvent::TransportError { reason } => {
                tracing::error!(%reason, "WebSocket error");
                if matches!(self.status, ConnectionStatus::Connecting | ConnectionStatus::Connected)
                {
                    self.status = ConnectionStatus::FailedToConnect;
                }
                vec![]
            },
            ControllerEvent::BrokerError { message, details } => {
                tracing::warn!(%message, "Broker reported error");
                tracing::warn!(%details, "Additional details");
                vec![]
            },
        }
    }

    /// Publish a chat line.
    ///
    /// Ignored (with a log line) when `text` is blank or the session is not
    /// live. The record is not appended locally: it shows up in the log when
    /// the broker echoes it back on the broadcast channel.
    pub fn send(&mut self, text: &str) -> Vec<ControllerAction> {
        if text.trim().is_empty() || !self.is_live() {
            tracing::info!(
                status = %self.status,
                "Unable to send message. The message is empty or the client is not connected."
            );
            return vec![];
        }

        let message = ChatMessage::chat(self.identity.as_str(), text);
        tracing::debug!(?message, "sending chat message");

        vec![ControllerAction::Publish { channel: Channel::Chat, message }]
    }

    /// Retire the session.
    ///
    /// Announces the departure if still connected, then releases the
    /// transport. Runs at most once; later calls return no actions.
    pub fn teardown(&mut self) -> Vec<ControllerAction> {
        if self.released {
            tracing::debug!("teardown already ran");
            return vec![];
        }
        self.released = true;

        let mut actions = Vec::with_capacity(2);

        if self.status == ConnectionStatus::Connected {
            let message = ChatMessage::disconnect(self.identity.as_str());
            tracing::debug!(?message, "announcing departure");
            actions.push(ControllerAction::Publish { channel: Channel::Announce, message });
        }

        if matches!(self.status, ConnectionStatus::Connecting | ConnectionStatus::Connected) {
            self.status = ConnectionStatus::Disconnected;
        }

        actions.push(ControllerAction::Close);
        actions
    }

    fn on_handshake(&mut self) -> Vec<ControllerAction> {
        if self.released || self.status != ConnectionStatus::Connecting {
            tracing::debug!(status = %self.status, "ignoring handshake outside Connecting");
            return vec![];
        }

        let join = ChatMessage::connect(self.identity.as_str());
        tracing::debug!(message = ?join, "announcing arrival");

        let actions = vec![
            ControllerAction::Publish { channel: Channel::Announce, message: join },
            ControllerAction::Subscribe { channel: Channel::Broadcast },
        ];

        self.status = ConnectionStatus::Connected;
        tracing::info!(identity = %self.identity, "connected");

        actions
    }

    fn on_message(&mut self, message: ChatMessage) {
        if !self.is_live() {
            tracing::debug!(status = %self.status, "dropping record outside live session");
            return;
        }
        self.log.append(message);
    }

    /// Whether the session can publish and receive.
    pub fn is_live(&self) -> bool {
        self.status == ConnectionStatus::Connected && !self.released
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Records received so far, in receipt order.
    pub fn log(&self) -> &MessageLog {
        &self.log
    }

    /// Local identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
