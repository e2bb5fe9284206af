//! Client configuration.

use std::fmt;

use stompchat_proto::destinations;

use crate::Channel;

/// Default broker endpoint: the raw WebSocket path of a SockJS endpoint
/// mounted at `/ws`.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws/websocket";

/// Default STOMP virtual host.
pub const DEFAULT_HOST: &str = "localhost";

/// Display name of the local user.
///
/// Supplied by the host application before the session starts and treated as
/// opaque text: it is neither validated nor normalised.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Wrap a display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Display name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Identity {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// Broker destinations for each logical [`Channel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destinations {
    /// Join/leave announcements.
    pub announce: String,
    /// Outbound chat lines.
    pub chat: String,
    /// Broadcast topic.
    pub broadcast: String,
}

impl Destinations {
    /// Destination for a channel.
    pub fn for_channel(&self, channel: Channel) -> &str {
        match channel {
            Channel::Announce => &self.announce,
            Channel::Chat => &self.chat,
            Channel::Broadcast => &self.broadcast,
        }
    }
}

impl Default for Destinations {
    fn default() -> Self {
        Self {
            announce: destinations::ADD_USER.to_string(),
            chat: destinations::SEND_MESSAGE.to_string(),
            broadcast: destinations::PUBLIC_TOPIC.to_string(),
        }
    }
}

/// Connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket URL of the broker.
    pub endpoint: String,
    /// Value of the STOMP `host` header.
    pub host: String,
    /// Broker destinations.
    pub destinations: Destinations,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            host: DEFAULT_HOST.to_string(),
            destinations: Destinations::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration pointing at `endpoint`.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), ..Self::default() }
    }
}
