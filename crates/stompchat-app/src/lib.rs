//! Application layer for stompchat
//!
//! Pure state machines and generic runtime for UI and session orchestration,
//! enabling deterministic simulation testing with the same code that runs in
//! production.
//!
//! # Components
//!
//! - [`App`]: UI state machine (status messages, terminal size)
//! - [`Bridge`]: Session bridge (translates App actions and transport events
//!   into controller events, controller actions into frames)
//! - [`Driver`]: Trait for platform-specific I/O abstraction
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`present`]: Maps a chat record to its display form

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod app;
mod bridge;
mod driver;
mod event;
mod input;
pub mod presenter;
mod runtime;

pub use action::AppAction;
pub use app::App;
pub use bridge::Bridge;
pub use driver::Driver;
pub use event::AppEvent;
pub use input::KeyInput;
pub use presenter::{Alignment, Avatar, MessageView, NoticeTone, present};
pub use runtime::Runtime;
