//! In-memory STOMP broker for simulation.
//!
//! `SimBroker` plays the server side of the chat: it answers the handshake,
//! records subscriptions, and rebroadcasts every record published to an
//! `/app/chat.*` destination on `/topic/public`. Everything runs
//! synchronously on the caller's thread, so a test fully controls the
//! interleaving of several clients.
//!
//! Traffic crosses the broker as encoded STOMP bytes in both directions, so
//! the frame codec is exercised exactly as over a real socket.

#![allow(clippy::disallowed_types, reason = "Synchronous locking operations only")]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use stompchat_client::TransportEvent;
use stompchat_proto::{ChatMessage, Command, Frame, destinations};

use crate::SimDriverError;

/// Broker-assigned connection identifier.
pub type SessionId = u64;

/// Broker shared between several simulated clients.
pub type SharedSimBroker = Arc<Mutex<SimBroker>>;

/// Create a broker wrapped for sharing between drivers.
pub fn create_shared_broker() -> SharedSimBroker {
    Arc::new(Mutex::new(SimBroker::new()))
}

/// What the broker has queued for one client.
#[derive(Debug, Clone)]
enum Delivery {
    Bytes(Vec<u8>),
    Closed,
    Error(String),
}

#[derive(Debug, Default)]
struct SimSession {
    inbox: VecDeque<Delivery>,
    /// `(subscription id, destination)`.
    subscriptions: Vec<(String, String)>,
    connected: bool,
    open: bool,
}

/// In-memory chat broker.
#[derive(Debug, Default)]
pub struct SimBroker {
    sessions: HashMap<SessionId, SimSession>,
    next_session: SessionId,
    next_message: u64,
    /// Every record broadcast on the public topic, in order.
    history: Vec<ChatMessage>,
    refuse_connections: bool,
}

impl SimBroker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or accept again) new transport connections.
    pub fn set_refuse_connections(&mut self, refuse: bool) {
        self.refuse_connections = refuse;
    }

    /// Accept a transport connection.
    pub fn open_session(&mut self, endpoint: &str) -> Result<SessionId, SimDriverError> {
        if self.refuse_connections {
            return Err(SimDriverError::ConnectionRefused { endpoint: endpoint.to_string() });
        }

        let id = self.next_session;
        self.next_session = self.next_session.saturating_add(1);
        self.sessions.insert(id, SimSession { open: true, ..SimSession::default() });
        tracing::debug!(session = id, "sim session opened");
        Ok(id)
    }

    /// Bytes written by a client.
    pub fn receive(&mut self, session: SessionId, bytes: &[u8]) -> Result<(), SimDriverError> {
        if !self.is_open(session) {
            return Err(SimDriverError::SessionClosed(session));
        }

        match Frame::decode_all(bytes) {
            Ok(frames) => {
                for frame in frames {
                    self.handle_frame(session, &frame);
                }
            },
            Err(e) => {
                self.reply(session, &error_frame("malformed frame", &e.to_string()));
            },
        }
        Ok(())
    }

    /// Next delivery for a client, decoded like a real transport would.
    pub fn poll(&mut self, session: SessionId) -> Option<TransportEvent> {
        let delivery = self.sessions.get_mut(&session)?.inbox.pop_front()?;
        Some(match delivery {
            Delivery::Bytes(bytes) => match Frame::decode_all(&bytes) {
                Ok(mut frames) if frames.len() == 1 => TransportEvent::Frame(frames.remove(0)),
                Ok(frames) => TransportEvent::Error(format!("{} frames in one delivery", frames.len())),
                Err(e) => TransportEvent::Malformed(e),
            },
            Delivery::Closed => TransportEvent::Closed,
            Delivery::Error(reason) => TransportEvent::Error(reason),
        })
    }

    /// Number of deliveries waiting for a client.
    pub fn pending(&self, session: SessionId) -> usize {
        self.sessions.get(&session).map_or(0, |s| s.inbox.len())
    }

    /// The client released its transport.
    pub fn close_session(&mut self, session: SessionId) {
        if let Some(state) = self.sessions.get_mut(&session) {
            state.open = false;
            state.connected = false;
            state.subscriptions.clear();
            state.inbox.clear();
            tracing::debug!(session, "sim session closed by client");
        }
    }

    /// Close a session from the server side. The client sees a transport
    /// close after whatever was already queued.
    pub fn drop_session(&mut self, session: SessionId) {
        self.end_session(session, Delivery::Closed);
    }

    /// Fail a session's transport. The client sees a transport error after
    /// whatever was already queued.
    pub fn fail_session(&mut self, session: SessionId, reason: &str) {
        self.end_session(session, Delivery::Error(reason.to_string()));
    }

    /// Queue raw bytes for a client, bypassing the broker logic.
    pub fn inject_raw(&mut self, session: SessionId, bytes: Vec<u8>) {
        if let Some(state) = self.sessions.get_mut(&session) {
            state.inbox.push_back(Delivery::Bytes(bytes));
        }
    }

    /// Every record broadcast so far.
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Whether the transport of `session` is still up.
    pub fn is_open(&self, session: SessionId) -> bool {
        self.sessions.get(&session).is_some_and(|s| s.open)
    }

    /// Number of sessions subscribed to the public topic.
    pub fn subscriber_count(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.open && s.subscriptions.iter().any(|(_, d)| d == destinations::PUBLIC_TOPIC))
            .count()
    }

    fn end_session(&mut self, session: SessionId, last: Delivery) {
        if let Some(state) = self.sessions.get_mut(&session)
            && state.open
        {
            state.open = false;
            state.connected = false;
            state.subscriptions.clear();
            state.inbox.push_back(last);
        }
    }

    fn handle_frame(&mut self, session: SessionId, frame: &Frame) {
        let connected = self.sessions.get(&session).is_some_and(|s| s.connected);

        match frame.command {
            Command::Connect | Command::Stomp => {
                if let Some(state) = self.sessions.get_mut(&session) {
                    state.connected = true;
                }
                let reply = Frame::new(Command::Connected)
                    .with_header("version", "1.2")
                    .with_header("heart-beat", "0,0")
                    .with_header("server", "stompchat-sim");
                self.reply(session, &reply);
            },
            _ if !connected => {
                self.reply(session, &error_frame("not connected", frame.command.as_str()));
            },
            Command::Subscribe => {
                let (Some(id), Some(destination)) = (frame.header("id"), frame.header("destination"))
                else {
                    self.reply(session, &error_frame("SUBSCRIBE needs id and destination", ""));
                    return;
                };
                if let Some(state) = self.sessions.get_mut(&session) {
                    state.subscriptions.push((id.to_string(), destination.to_string()));
                }
            },
            Command::Unsubscribe => {
                if let (Some(id), Some(state)) = (frame.header("id"), self.sessions.get_mut(&session))
                {
                    state.subscriptions.retain(|(sub, _)| sub != id);
                }
            },
            Command::Send => self.handle_send(session, frame),
            Command::Disconnect => {
                if let Some(receipt) = frame.header("receipt") {
                    let reply = Frame::new(Command::Receipt).with_header("receipt-id", receipt);
                    self.reply(session, &reply);
                }
                if let Some(state) = self.sessions.get_mut(&session) {
                    state.connected = false;
                    state.subscriptions.clear();
                }
            },
            Command::Ack
            | Command::Nack
            | Command::Begin
            | Command::Commit
            | Command::Abort
            | Command::Connected
            | Command::Message
            | Command::Receipt
            | Command::Error => {
                self.reply(session, &error_frame("unsupported command", frame.command.as_str()));
            },
        }
    }

    fn handle_send(&mut self, session: SessionId, frame: &Frame) {
        let destination = frame.header("destination").unwrap_or_default();
        if destination != destinations::ADD_USER && destination != destinations::SEND_MESSAGE {
            self.reply(session, &error_frame("unknown destination", destination));
            return;
        }

        let message = match ChatMessage::from_json(&frame.body) {
            Ok(message) => message,
            Err(e) => {
                self.reply(session, &error_frame("malformed record", &e.to_string()));
                return;
            },
        };

        self.broadcast(message, frame.body.to_vec());
    }

    fn broadcast(&mut self, message: ChatMessage, body: Vec<u8>) {
        tracing::debug!(?message, "sim broadcast");
        self.history.push(message);

        let message_id = format!("m-{}", self.next_message);
        self.next_message = self.next_message.saturating_add(1);

        for state in self.sessions.values_mut().filter(|s| s.open) {
            let subscriptions =
                state.subscriptions.iter().filter(|(_, d)| d == destinations::PUBLIC_TOPIC);
            for (id, _) in subscriptions {
                let frame = Frame::new(Command::Message)
                    .with_header("destination", destinations::PUBLIC_TOPIC)
                    .with_header("subscription", id.clone())
                    .with_header("message-id", message_id.clone())
                    .with_header("content-type", "application/json")
                    .with_body(body.clone());
                if let Ok(bytes) = frame.to_vec() {
                    state.inbox.push_back(Delivery::Bytes(bytes));
                }
            }
        }
    }

    fn reply(&mut self, session: SessionId, frame: &Frame) {
        let Some(state) = self.sessions.get_mut(&session) else {
            return;
        };
        match frame.to_vec() {
            Ok(bytes) => state.inbox.push_back(Delivery::Bytes(bytes)),
            Err(e) => tracing::warn!(error = %e, "sim broker cannot encode reply"),
        }
    }
}

fn error_frame(message: &str, details: &str) -> Frame {
    Frame::new(Command::Error).with_header("message", message).with_body(details.as_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send(broker: &mut SimBroker, session: SessionId, frame: &Frame) {
        broker.receive(session, &frame.to_vec().unwrap()).unwrap();
    }

    fn connect(broker: &mut SimBroker) -> SessionId {
        let session = broker.open_session("sim").unwrap();
        send(broker, session, &Frame::new(Command::Connect));
        assert!(matches!(
            broker.poll(session),
            Some(TransportEvent::Frame(Frame { command: Command::Connected, .. }))
        ));
        session
    }

    fn subscribe(broker: &mut SimBroker, session: SessionId) {
        send(
            broker,
            session,
            &Frame::new(Command::Subscribe)
                .with_header("id", "sub-0")
                .with_header("destination", destinations::PUBLIC_TOPIC),
        );
    }

    fn publish(broker: &mut SimBroker, session: SessionId, destination: &str, message: &ChatMessage) {
        send(
            broker,
            session,
            &Frame::new(Command::Send)
                .with_header("destination", destination)
                .with_body(message.to_json().unwrap().into_bytes()),
        );
    }

    #[test]
    fn send_is_broadcast_to_subscribers_only() {
        let mut broker = SimBroker::new();
        let alice = connect(&mut broker);
        let bob = connect(&mut broker);
        subscribe(&mut broker, alice);

        publish(&mut broker, bob, destinations::SEND_MESSAGE, &ChatMessage::chat("Bob", "hey"));

        let Some(TransportEvent::Frame(frame)) = broker.poll(alice) else {
            panic!("alice should receive the broadcast");
        };
        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.header("subscription"), Some("sub-0"));
        assert_eq!(ChatMessage::from_json(&frame.body).unwrap(), ChatMessage::chat("Bob", "hey"));
        assert_eq!(broker.poll(bob), None);
        assert_eq!(broker.history(), &[ChatMessage::chat("Bob", "hey")]);
    }

    #[test]
    fn unknown_destination_is_an_error() {
        let mut broker = SimBroker::new();
        let alice = connect(&mut broker);

        publish(&mut broker, alice, "/app/elsewhere", &ChatMessage::chat("Alice", "x"));

        assert!(matches!(
            broker.poll(alice),
            Some(TransportEvent::Frame(Frame { command: Command::Error, .. }))
        ));
        assert!(broker.history().is_empty());
    }

    #[test]
    fn disconnect_is_acknowledged() {
        let mut broker = SimBroker::new();
        let alice = connect(&mut broker);
        subscribe(&mut broker, alice);

        send(&mut broker, alice, &Frame::new(Command::Disconnect).with_header("receipt", "d-1"));

        let Some(TransportEvent::Frame(frame)) = broker.poll(alice) else {
            panic!("expected receipt");
        };
        assert_eq!(frame.command, Command::Receipt);
        assert_eq!(frame.header("receipt-id"), Some("d-1"));
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[test]
    fn frames_before_connect_are_rejected() {
        let mut broker = SimBroker::new();
        let session = broker.open_session("sim").unwrap();
        subscribe(&mut broker, session);

        assert!(matches!(
            broker.poll(session),
            Some(TransportEvent::Frame(Frame { command: Command::Error, .. }))
        ));
    }

    #[test]
    fn dropped_session_reports_close_after_queue() {
        let mut broker = SimBroker::new();
        let alice = connect(&mut broker);
        subscribe(&mut broker, alice);
        let bob = connect(&mut broker);
        publish(&mut broker, bob, destinations::ADD_USER, &ChatMessage::connect("Bob"));

        broker.drop_session(alice);

        assert!(matches!(broker.poll(alice), Some(TransportEvent::Frame(_))));
        assert_eq!(broker.poll(alice), Some(TransportEvent::Closed));
        assert_eq!(
            broker.receive(alice, b"SEND\n\n\0"),
            Err(SimDriverError::SessionClosed(alice))
        );
    }

    #[test]
    fn refused_connection() {
        let mut broker = SimBroker::new();
        broker.set_refuse_connections(true);

        assert!(matches!(broker.open_session("sim"), Err(SimDriverError::ConnectionRefused { .. })));
    }

    #[test]
    fn raw_garbage_is_malformed() {
        let mut broker = SimBroker::new();
        let alice = connect(&mut broker);
        broker.inject_raw(alice, b"BOGUS\n\n\0".to_vec());

        assert!(matches!(broker.poll(alice), Some(TransportEvent::Malformed(_))));
    }
}
