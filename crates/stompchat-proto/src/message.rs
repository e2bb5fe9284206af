//! Chat records.
//!
//! A record is a flat JSON object:
//!
//! ```json
//! {"type":"CONNECT","sender":"Alice"}
//! {"type":"CHAT","sender":"Alice","content":"hi"}
//! ```
//!
//! Field names and the `type` values are part of the wire contract and are
//! case-sensitive.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{ProtocolError, Result};

/// Record kind, as carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A user joined.
    Connect,
    /// A user left.
    Disconnect,
    /// A chat line.
    Chat,
}

impl MessageKind {
    /// Wire value of the `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::Chat => "CHAT",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "CONNECT" => Some(Self::Connect),
            "DISCONNECT" => Some(Self::Disconnect),
            "CHAT" => Some(Self::Chat),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat record.
///
/// Each variant carries exactly the fields its kind requires: presence
/// announcements have no content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum ChatMessage {
    /// `sender` joined the chat.
    #[serde(rename = "CONNECT")]
    Connect {
        /// Display name of the user.
        sender: String,
    },
    /// `sender` left the chat.
    #[serde(rename = "DISCONNECT")]
    Disconnect {
        /// Display name of the user.
        sender: String,
    },
    /// `sender` said `content`.
    #[serde(rename = "CHAT")]
    Chat {
        /// Display name of the user.
        sender: String,
        /// Message text.
        content: String,
    },
}

impl ChatMessage {
    /// Join announcement for `sender`.
    pub fn connect(sender: impl Into<String>) -> Self {
        Self::Connect { sender: sender.into() }
    }

    /// Leave announcement for `sender`.
    pub fn disconnect(sender: impl Into<String>) -> Self {
        Self::Disconnect { sender: sender.into() }
    }

    /// Chat line from `sender`.
    pub fn chat(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Chat { sender: sender.into(), content: content.into() }
    }

    /// Display name of the sender.
    pub fn sender(&self) -> &str {
        match self {
            Self::Connect { sender } | Self::Disconnect { sender } | Self::Chat { sender, .. } => {
                sender
            },
        }
    }

    /// Record kind.
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Connect { .. } => MessageKind::Connect,
            Self::Disconnect { .. } => MessageKind::Disconnect,
            Self::Chat { .. } => MessageKind::Chat,
        }
    }

    /// Message text. `None` for presence announcements.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Chat { content, .. } => Some(content),
            Self::Connect { .. } | Self::Disconnect { .. } => None,
        }
    }

    /// Serialize to the JSON wire form.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Json` if serialization fails
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Json(e.to_string()))
    }

    /// Parse the JSON wire form.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Json` for malformed JSON
    /// - `ProtocolError::InvalidRecord` for a missing sender or unknown `type`
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let wire: WireRecord =
            serde_json::from_slice(bytes).map_err(|e| ProtocolError::Json(e.to_string()))?;
        Self::try_from(wire)
    }
}

/// Loosely-typed record as it may arrive from the broker.
///
/// Brokers commonly serialize absent fields as `null` (`"content": null` on
/// presence records), so every field is optional here and validated in
/// [`TryFrom<WireRecord>`].
#[derive(Debug, Default, Deserialize)]
struct WireRecord {
    #[serde(default)]
    sender: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl TryFrom<WireRecord> for ChatMessage {
    type Error = ProtocolError;

    fn try_from(wire: WireRecord) -> Result<Self> {
        let sender =
            wire.sender.ok_or_else(|| ProtocolError::InvalidRecord("missing sender".into()))?;

        // Untyped records are chat lines; absent content reads as empty.
        let kind = match wire.kind.as_deref() {
            None => MessageKind::Chat,
            Some(value) => MessageKind::parse(value).ok_or_else(|| {
                ProtocolError::InvalidRecord(format!("unknown message type {value:?}"))
            })?,
        };

        Ok(match kind {
            MessageKind::Connect => Self::Connect { sender },
            MessageKind::Disconnect => Self::Disconnect { sender },
            MessageKind::Chat => Self::Chat { sender, content: wire.content.unwrap_or_default() },
        })
    }
}

impl<'de> Deserialize<'de> for ChatMessage {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = WireRecord::deserialize(deserializer)?;
        Self::try_from(wire).map_err(serde::de::Error::custom)
    }
}
