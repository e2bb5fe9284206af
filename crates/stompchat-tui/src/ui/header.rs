//! Header bar
//!
//! Connection status label, read straight from the controller.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use stompchat_app::App;
use stompchat_client::{ConnectionController, ConnectionStatus};

/// Render the header bar.
pub fn render(frame: &mut Frame, app: &App, session: &ConnectionController, area: Rect) {
    let status = session.status();
    let color = match status {
        ConnectionStatus::Connecting => Color::Yellow,
        ConnectionStatus::Connected => Color::Green,
        ConnectionStatus::Disconnected => Color::Gray,
        ConnectionStatus::FailedToConnect => Color::Red,
    };

    let line = Line::from(vec![
        Span::styled(" stompchat ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(status.label(), Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" | {} @ {}", app.identity().as_str(), app.endpoint()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).style(Style::default().bg(Color::Black)), area);
}
