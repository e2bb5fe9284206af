//! Application side-effects and intents.
//!
//! This module defines the [`AppAction`] enum, which represents instructions
//! produced by the [`crate::App`] state machine for the runtime to execute.

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Tear down the session and quit the application.
    Quit,

    /// Publish a chat line on the current session.
    SendMessage {
        /// Text as typed by the user.
        text: String,
    },

    /// Tear down the current session and start a new one.
    Reconnect,
}
