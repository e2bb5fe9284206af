//! Simulation errors.

use stompchat_proto::ProtocolError;
use thiserror::Error;

use crate::SessionId;

/// Error type for the simulation driver and broker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimDriverError {
    /// The broker is refusing new connections.
    #[error("connection refused: {endpoint}")]
    ConnectionRefused {
        /// Endpoint the driver tried to reach.
        endpoint: String,
    },

    /// No transport is held.
    #[error("not connected")]
    NotConnected,

    /// The broker already closed this session.
    #[error("session {0} is closed")]
    SessionClosed(SessionId),

    /// Rendering was scripted to fail.
    #[error("render failed")]
    RenderFailed,

    /// A frame could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
