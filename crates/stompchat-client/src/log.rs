//! Append-only message log.

use std::slice;

use stompchat_proto::ChatMessage;

/// Ordered record of every message received in one session.
///
/// Only the owning [`crate::ConnectionController`] appends; everyone else
/// gets a shared reference. There is no removal or clear operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageLog {
    entries: Vec<ChatMessage>,
}

impl MessageLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, message: ChatMessage) {
        self.entries.push(message);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no record was received yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records in receipt order.
    pub fn iter(&self) -> slice::Iter<'_, ChatMessage> {
        self.entries.iter()
    }

    /// Records in receipt order.
    pub fn as_slice(&self) -> &[ChatMessage] {
        &self.entries
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a ChatMessage;
    type IntoIter = slice::Iter<'a, ChatMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
