//! STOMP session state machine.
//!
//! Speaks STOMP 1.2 on behalf of the [`crate::ConnectionController`]:
//! builds the `CONNECT` frame, recognises the broker's replies, and turns
//! controller actions into `SEND`, `SUBSCRIBE` and `DISCONNECT` frames.
//! Sans-IO: frames in, frames out.
//!
//! ```text
//! ┌──────┐ CONNECT ┌────────────┐ CONNECTED ┌───────────┐ DISCONNECT ┌─────────┐ RECEIPT ┌────────┐
//! │ Idle │────────>│ Handshake  │──────────>│ Connected │───────────>│ Closing │────────>│ Closed │
//! └──────┘         └────────────┘           └───────────┘            └─────────┘         └────────┘
//! ```

use stompchat_proto::{ChatMessage, Command, Frame};

use crate::{ClientConfig, ControllerAction, ControllerEvent, SessionError, event::Channel};

/// STOMP protocol version we speak.
pub const STOMP_VERSION: &str = "1.2";

/// Heart-beating is disabled in both directions.
pub const HEART_BEAT: &str = "0,0";

const JSON_CONTENT_TYPE: &str = "application/json";

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing sent yet.
    Idle,
    /// `CONNECT` sent, waiting for `CONNECTED`.
    Handshake,
    /// Handshake complete.
    Connected,
    /// `DISCONNECT` sent, waiting for its receipt.
    Closing,
    /// Session finished.
    Closed,
}

/// Client side of one STOMP session.
#[derive(Debug, Clone)]
pub struct StompSession {
    config: ClientConfig,
    state: SessionState,
    /// Active subscriptions as `(id, channel)`.
    subscriptions: Vec<(String, Channel)>,
    next_subscription: u64,
    next_receipt: u64,
    /// Receipt id of our `DISCONNECT`, if sent.
    disconnect_receipt: Option<String>,
}

impl StompSession {
    /// Create an idle session.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            subscriptions: Vec::new(),
            next_subscription: 0,
            next_receipt: 0,
            disconnect_receipt: None,
        }
    }

    /// Build the `CONNECT` frame that opens the session.
    pub fn connect_frame(&mut self) -> Frame {
        self.state = SessionState::Handshake;

        Frame::new(Command::Connect)
            .with_header("accept-version", STOMP_VERSION)
            .with_header("host", self.config.host.clone())
            .with_header("heart-beat", HEART_BEAT)
    }

    /// Interpret a frame from the broker.
    ///
    /// Returns the controller event it maps to, or `None` for frames that
    /// only concern the session (receipts).
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] for frames that make no sense in the
    /// current state or carry an undecodable record. These are broker-level
    /// problems; the caller reports them as diagnostics.
    pub fn handle_frame(&mut self, frame: Frame) -> Result<Option<ControllerEvent>, SessionError> {
        match frame.command {
            Command::Connected => {
                if self.state != SessionState::Handshake {
                    return Err(self.unexpected(&frame));
                }
                self.state = SessionState::Connected;
                tracing::debug!(
                    version = frame.header("version").unwrap_or("1.0"),
                    server = frame.header("server").unwrap_or("unknown"),
                    "STOMP session established"
                );
                Ok(Some(ControllerEvent::HandshakeComplete))
            },
            Command::Message => {
                if !matches!(self.state, SessionState::Connected | SessionState::Closing) {
                    return Err(self.unexpected(&frame));
                }
                if let Some(id) = frame.header("subscription")
                    && !self.subscriptions.iter().any(|(sub, _)| sub == id)
                {
                    return Err(SessionError::UnknownSubscription(id.to_string()));
                }
                let message = ChatMessage::from_json(&frame.body)?;
                Ok(Some(ControllerEvent::MessageReceived(message)))
            },
            Command::Error => Ok(Some(ControllerEvent::BrokerError {
                message: frame.header("message").unwrap_or_default().to_string(),
                details: frame.body_str().into_owned(),
            })),
            Command::Receipt => {
                let receipt = frame.header("receipt-id").unwrap_or_default();
                tracing::debug!(%receipt, "receipt");
                if self.state == SessionState::Closing
                    && self.disconnect_receipt.as_deref() == Some(receipt)
                {
                    self.state = SessionState::Closed;
                }
                Ok(None)
            },
            Command::Connect
            | Command::Stomp
            | Command::Send
            | Command::Subscribe
            | Command::Unsubscribe
            | Command::Ack
            | Command::Nack
            | Command::Begin
            | Command::Commit
            | Command::Abort
            | Command::Disconnect => Err(self.unexpected(&frame)),
        }
    }

    /// Translate a controller action into the frame that carries it.
    ///
    /// `Close` yields a `DISCONNECT` only when the handshake completed;
    /// otherwise there is nothing to say to the broker and `None` is
    /// returned.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotConnected` for publish/subscribe before the
    ///   handshake
    /// - `SessionError::Protocol` if the record cannot be serialized
    pub fn encode_action(&mut self, action: &ControllerAction) -> Result<Option<Frame>, SessionError> {
        match action {
            ControllerAction::Publish { channel, message } => {
                self.require_connected("publish")?;
                let body = message.to_json()?;
                Ok(Some(
                    Frame::new(Command::Send)
                        .with_header("destination", self.config.destinations.for_channel(*channel))
                        .with_header("content-type", JSON_CONTENT_TYPE)
                        .with_body(body.into_bytes()),
                ))
            },
            ControllerAction::Subscribe { channel } => {
                self.require_connected("subscribe")?;
                let id = format!("sub-{}", self.next_subscription);
                self.next_subscription = self.next_subscription.saturating_add(1);
                self.subscriptions.push((id.clone(), *channel));
                Ok(Some(
                    Frame::new(Command::Subscribe)
                        .with_header("id", id)
                        .with_header("destination", self.config.destinations.for_channel(*channel))
                        .with_header("ack", "auto"),
                ))
            },
            ControllerAction::Close => {
                if self.state != SessionState::Connected {
                    self.state = SessionState::Closed;
                    return Ok(None);
                }
                let receipt = format!("disconnect-{}", self.next_receipt);
                self.next_receipt = self.next_receipt.saturating_add(1);
                self.disconnect_receipt = Some(receipt.clone());
                self.state = SessionState::Closing;
                Ok(Some(Frame::new(Command::Disconnect).with_header("receipt", receipt)))
            },
        }
    }

    /// The transport is gone; nothing more can be said to the broker.
    pub fn transport_lost(&mut self) {
        if self.state != SessionState::Closed {
            tracing::debug!(state = ?self.state, "transport lost");
        }
        self.state = SessionState::Closed;
        self.subscriptions.clear();
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn require_connected(&self, operation: &'static str) -> Result<(), SessionError> {
        if self.state == SessionState::Connected {
            Ok(())
        } else {
            Err(SessionError::NotConnected { operation, state: self.state })
        }
    }

    fn unexpected(&self, frame: &Frame) -> SessionError {
        SessionError::UnexpectedFrame { command: frame.command, state: self.state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshaken() -> StompSession {
        let mut session = StompSession::new(ClientConfig::default());
        let _ = session.connect_frame();
        let event = session.handle_frame(Frame::new(Command::Connected).with_header("version", "1.2"));
        assert_eq!(event, Ok(Some(ControllerEvent::HandshakeComplete)));
        session
    }

    #[test]
    fn connect_frame_negotiates_version() {
        let mut session = StompSession::new(ClientConfig::default());
        let frame = session.connect_frame();

        assert_eq!(frame.command, Command::Connect);
        assert_eq!(frame.header("accept-version"), Some("1.2"));
        assert_eq!(frame.header("host"), Some("localhost"));
        assert_eq!(frame.header("heart-beat"), Some("0,0"));
        assert_eq!(session.state(), SessionState::Handshake);
    }

    #[test]
    fn connected_outside_handshake_is_rejected() {
        let mut session = StompSession::new(ClientConfig::default());
        let result = session.handle_frame(Frame::new(Command::Connected));
        assert!(matches!(result, Err(SessionError::UnexpectedFrame { .. })));
    }

    #[test]
    fn publish_maps_channel_to_destination() {
        let mut session = handshaken();
        let frame = session
            .encode_action(&ControllerAction::Publish {
                channel: Channel::Chat,
                message: ChatMessage::chat("Alice", "hi"),
            })
            .unwrap()
            .unwrap();

        assert_eq!(frame.command, Command::Send);
        assert_eq!(frame.header("destination"), Some("/app/chat.send-message"));
        assert_eq!(frame.header("content-type"), Some("application/json"));
        assert_eq!(ChatMessage::from_json(&frame.body).unwrap(), ChatMessage::chat("Alice", "hi"));
    }

    #[test]
    fn publish_before_handshake_is_rejected() {
        let mut session = StompSession::new(ClientConfig::default());
        let result = session.encode_action(&ControllerAction::Publish {
            channel: Channel::Announce,
            message: ChatMessage::connect("Alice"),
        });
        assert!(matches!(result, Err(SessionError::NotConnected { operation: "publish", .. })));
    }

    #[test]
    fn subscribe_assigns_ids() {
        let mut session = handshaken();
        let frame = session
            .encode_action(&ControllerAction::Subscribe { channel: Channel::Broadcast })
            .unwrap()
            .unwrap();

        assert_eq!(frame.command, Command::Subscribe);
        assert_eq!(frame.header("id"), Some("sub-0"));
        assert_eq!(frame.header("destination"), Some("/topic/public"));
        assert_eq!(session.subscription_count(), 1);
    }

    #[test]
    fn message_decodes_record() {
        let mut session = handshaken();
        let _ = session.encode_action(&ControllerAction::Subscribe { channel: Channel::Broadcast });

        let frame = Frame::new(Command::Message)
            .with_header("subscription", "sub-0")
            .with_header("destination", "/topic/public")
            .with_body(&br#"{"sender":"Bob","type":"CONNECT"}"#[..]);

        assert_eq!(
            session.handle_frame(frame),
            Ok(Some(ControllerEvent::MessageReceived(ChatMessage::connect("Bob"))))
        );
    }

    #[test]
    fn message_for_unknown_subscription_is_rejected() {
        let mut session = handshaken();
        let frame = Frame::new(Command::Message)
            .with_header("subscription", "sub-9")
            .with_body(&br#"{"sender":"Bob","type":"CONNECT"}"#[..]);

        assert_eq!(
            session.handle_frame(frame),
            Err(SessionError::UnknownSubscription("sub-9".into()))
        );
    }

    #[test]
    fn malformed_record_is_a_session_error() {
        let mut session = handshaken();
        let _ = session.encode_action(&ControllerAction::Subscribe { channel: Channel::Broadcast });
        let frame = Frame::new(Command::Message)
            .with_header("subscription", "sub-0")
            .with_body(&b"not json"[..]);

        assert!(matches!(session.handle_frame(frame), Err(SessionError::Protocol(_))));
    }

    #[test]
    fn error_frame_becomes_broker_error() {
        let mut session = handshaken();
        let frame = Frame::new(Command::Error)
            .with_header("message", "malformed frame received")
            .with_body(&b"details"[..]);

        assert_eq!(
            session.handle_frame(frame),
            Ok(Some(ControllerEvent::BrokerError {
                message: "malformed frame received".into(),
                details: "details".into(),
            }))
        );
    }

    #[test]
    fn close_sends_disconnect_with_receipt() {
        let mut session = handshaken();
        let frame = session.encode_action(&ControllerAction::Close).unwrap().unwrap();

        assert_eq!(frame.command, Command::Disconnect);
        assert_eq!(frame.header("receipt"), Some("disconnect-0"));
        assert_eq!(session.state(), SessionState::Closing);

        let receipt = Frame::new(Command::Receipt).with_header("receipt-id", "disconnect-0");
        assert_eq!(session.handle_frame(receipt), Ok(None));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn close_before_handshake_sends_nothing() {
        let mut session = StompSession::new(ClientConfig::default());
        let _ = session.connect_frame();

        assert_eq!(session.encode_action(&ControllerAction::Close), Ok(None));
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn close_after_transport_loss_sends_nothing() {
        let mut session = handshaken();
        session.transport_lost();

        assert_eq!(session.encode_action(&ControllerAction::Close), Ok(None));
        assert_eq!(session.subscription_count(), 0);
        assert!(session.handle_frame(Frame::new(Command::Connected)).is_err());
    }

    #[test]
    fn client_commands_from_broker_are_rejected() {
        let mut session = handshaken();
        let result = session.handle_frame(Frame::new(Command::Send));
        assert!(matches!(
            result,
            Err(SessionError::UnexpectedFrame { command: Command::Send, state: SessionState::Connected })
        ));
    }
}
