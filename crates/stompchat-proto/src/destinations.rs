//! Broker destinations used by the chat application.
//!
//! The broker routes `SEND` frames addressed to an application prefix
//! (`/app/...`) to its handlers, which rebroadcast the resulting record on the
//! public topic.

/// Join and leave announcements (`CONNECT` / `DISCONNECT` records).
pub const ADD_USER: &str = "/app/chat.add-user";

/// Outbound chat records (`CHAT`).
pub const SEND_MESSAGE: &str = "/app/chat.send-message";

/// Broadcast topic delivering every record to all subscribers, including
/// echoes of our own publishes.
pub const PUBLIC_TOPIC: &str = "/topic/public";
