//! Session error types.

use stompchat_proto::{Command, ProtocolError};
use thiserror::Error;

use crate::SessionState;

/// Errors from the STOMP session state machine.
///
/// All of these are broker-level: they are reported as diagnostics and never
/// change the connection status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Frame not valid in the current session state.
    #[error("unexpected {command} frame in state {state:?}")]
    UnexpectedFrame {
        /// Command of the offending frame
        command: Command,
        /// Session state when it arrived
        state: SessionState,
    },

    /// `MESSAGE` for a subscription we never made.
    #[error("message for unknown subscription {0:?}")]
    UnknownSubscription(String),

    /// Outbound operation attempted before the handshake completed.
    #[error("cannot {operation} in state {state:?}")]
    NotConnected {
        /// Attempted operation
        operation: &'static str,
        /// Session state at the time
        state: SessionState,
    },

    /// Frame or record could not be decoded/encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
