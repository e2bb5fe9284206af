//! Application input events.
//!
//! This module defines [`AppEvent`], the set of inputs that drive the
//! [`crate::App`] state machine.
//!
//! Events originate from two distinct sources:
//! - Terminal notifications (resize) and system ticks.
//! - Session notifications translated by the [`crate::Bridge`].

use stompchat_client::ConnectionStatus;

/// Events processed by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Periodic tick.
    Tick,

    /// Terminal resize (columns, rows).
    Resize(u16, u16),

    /// Connection status changed.
    StatusChanged {
        /// New status.
        status: ConnectionStatus,
    },

    /// New records were appended to the session log.
    MessagesAppended {
        /// Number of records appended.
        count: usize,
    },
}
