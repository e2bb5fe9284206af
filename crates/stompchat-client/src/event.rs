//! Controller events and actions.

use stompchat_proto::{ChatMessage, Frame, ProtocolError};

/// Logical broker channels.
///
/// Mapped to concrete destinations by [`crate::Destinations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Join/leave announcements (`CONNECT` / `DISCONNECT` records).
    Announce,
    /// Outbound chat lines (`CHAT` records).
    Chat,
    /// Broadcast of every record to every session.
    Broadcast,
}

/// Lifecycle notifications the caller feeds into the controller.
///
/// The caller is responsible for:
/// - Translating transport notifications (close, error)
/// - Translating broker frames (handshake, inbound records, errors)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Broker handshake completed.
    HandshakeComplete,

    /// Record delivered on the broadcast subscription.
    MessageReceived(ChatMessage),

    /// Transport closed (network drop or server close).
    TransportClosed,

    /// Transport-level failure (unreachable endpoint, socket error).
    TransportError {
        /// Error description.
        reason: String,
    },

    /// Broker-level protocol error.
    BrokerError {
        /// Short description (STOMP `message` header).
        message: String,
        /// Additional details (STOMP error body).
        details: String,
    },
}

/// Actions the controller produces for the caller to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerAction {
    /// Publish a record on a channel.
    Publish {
        /// Target channel.
        channel: Channel,
        /// Record to serialize.
        message: ChatMessage,
    },

    /// Subscribe to a channel.
    Subscribe {
        /// Channel to subscribe to.
        channel: Channel,
    },

    /// Close the session and release the transport.
    Close,
}

/// Notifications from a transport.
///
/// Produced by the WebSocket task (or a simulated broker) and translated into
/// [`ControllerEvent`]s by whoever drives the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A frame arrived.
    Frame(Frame),
    /// Bytes arrived that do not form a valid frame.
    Malformed(ProtocolError),
    /// The socket closed.
    Closed,
    /// The socket failed.
    Error(String),
}
