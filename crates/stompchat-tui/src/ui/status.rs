//! Status line
//!
//! Transient status message plus a short key reminder.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use stompchat_app::App;

const HINT: &str = "Enter send | /reconnect | /quit or Esc";

/// Render the status line.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let line = match app.status_message() {
        Some(message) => Line::from(vec![
            Span::raw(" "),
            Span::styled(message.to_string(), Style::default().fg(Color::White)),
        ]),
        None => Line::from(Span::styled(format!(" {HINT}"), Style::default().fg(Color::Gray))),
    };

    let paragraph = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(paragraph, area);
}
