//! Terminal UI for stompchat
//!
//! A thin shell over [`stompchat_app::Driver`] that provides terminal-specific
//! I/O. All orchestration logic lives in the generic [`stompchat_app::Runtime`].
//!
//! This crate only handles terminal input, rendering and the WebSocket
//! transport hookup.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod input;
pub mod terminal;
pub mod ui;

pub use input::InputState;
pub use stompchat_app::{App, AppAction, AppEvent, Bridge, Driver, KeyInput, Runtime};
pub use terminal::{TerminalDriver, TerminalError};
