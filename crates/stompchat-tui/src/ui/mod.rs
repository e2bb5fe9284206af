//! UI rendering
//!
//! Rendering functions that convert App and session state into terminal
//! output using ratatui widgets. All functions are pure (no I/O), taking
//! state and drawing into the frame.

mod chat;
mod header;
mod input;
mod status;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};
use stompchat_app::App;
use stompchat_client::ConnectionController;

use crate::InputState;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App, session: &ConnectionController, input: &InputState) {
    const HEADER_HEIGHT: u16 = 1;
    const CHAT_AREA_MIN_HEIGHT: u16 = 3;
    const INPUT_HEIGHT: u16 = 3;
    const STATUS_HEIGHT: u16 = 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(CHAT_AREA_MIN_HEIGHT),
            Constraint::Length(INPUT_HEIGHT),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let [header_area, chat_area, input_area, status_area] = chunks.as_ref() else {
        return;
    };

    header::render(frame, app, session, *header_area);
    chat::render(frame, app, session, *chat_area);
    input::render(frame, input, *input_area);
    status::render(frame, app, *status_area);
}
