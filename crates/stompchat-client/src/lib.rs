//! Client
//!
//! Action-based connection controller for a STOMP chat broker. Tracks the
//! session lifecycle, owns the message log, and translates between chat
//! records and STOMP frames.
//!
//! # Architecture
//!
//! Both state machines are Sans-IO. They receive events, update their state,
//! and return actions for the caller to execute:
//!
//! - [`ConnectionController`]: lifecycle (`Connecting`, `Connected`,
//!   `Disconnected`, `FailedToConnect`), presence announcements, the outbound
//!   send operation and the append-only [`MessageLog`].
//! - [`StompSession`]: STOMP handshake, subscription bookkeeping, and the
//!   mapping of [`ControllerAction`]s to frames and of frames to
//!   [`ControllerEvent`]s.
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedClient`]: WebSocket I/O task behind channels
//! - [`transport::connect`]: Connect to a broker endpoint

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod controller;
mod error;
mod event;
mod log;
mod session;

#[cfg(feature = "transport")]
pub mod transport;

pub use config::{ClientConfig, DEFAULT_ENDPOINT, DEFAULT_HOST, Destinations, Identity};
pub use controller::{ConnectionController, ConnectionStatus};
pub use error::SessionError;
pub use event::{Channel, ControllerAction, ControllerEvent, TransportEvent};
pub use log::MessageLog;
pub use session::{SessionState, StompSession};
pub use stompchat_proto::{ChatMessage, Frame, MessageKind};
