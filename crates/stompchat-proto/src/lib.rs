//! Wire types for stompchat
//!
//! Everything that crosses the broker boundary lives here:
//!
//! - [`ChatMessage`]: the chat record, serialized as a flat JSON object whose
//!   `type` field is one of `CONNECT`, `DISCONNECT` or `CHAT`.
//! - [`Frame`]: a STOMP 1.2 frame with its text codec.
//! - [`destinations`]: the broker destinations the chat application uses.
//!
//! Nothing in this crate performs I/O.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod destinations;
pub mod errors;
pub mod frame;
pub mod message;

pub use errors::{ProtocolError, Result};
pub use frame::{Command, Frame};
pub use message::{ChatMessage, MessageKind};
