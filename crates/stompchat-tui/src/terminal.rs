//! Terminal driver for the TUI.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. The broker connection is a
//! WebSocket handled by [`stompchat_client::transport`].

use std::io::{self, Stdout, stdout};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use stompchat_app::{App, AppAction, AppEvent, Driver, KeyInput};
use stompchat_client::{
    ConnectionController, TransportEvent,
    transport::{self, ConnectedClient, TransportError},
};
use stompchat_proto::Frame;
use thiserror::Error;

use crate::{InputState, ui};

/// Interval between ticks when the user is idle.
const TICK_INTERVAL: tokio::time::Duration = tokio::time::Duration::from_millis(100);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Send attempted without an open connection.
    #[error("not connected")]
    NotConnected,

    /// The connection task is gone.
    #[error("connection closed")]
    ChannelClosed,
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm), rendering (ratatui), and the WebSocket
/// connection. Owns the input state for text editing.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    connection: Option<ConnectedClient>,
    input_state: InputState,
}

impl TerminalDriver {
    /// Enter raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be set up.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;
        let event_stream = EventStream::new();

        Ok(Self { terminal, event_stream, connection: None, input_state: InputState::new() })
    }

    /// Convert a crossterm key event to `KeyInput`.
    fn convert_key(key: KeyEvent) -> Option<KeyInput> {
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                Some(KeyInput::ShiftEnter)
            },
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Delete => Some(KeyInput::Delete),
            KeyCode::Esc => Some(KeyInput::Esc),
            KeyCode::Left => Some(KeyInput::Left),
            KeyCode::Right => Some(KeyInput::Right),
            KeyCode::Home => Some(KeyInput::Home),
            KeyCode::End => Some(KeyInput::End),
            _ => None,
        }
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;

    async fn poll_event(&mut self, app: &mut App) -> Result<Vec<AppAction>, Self::Error> {
        tokio::select! {
            biased;

            // Terminal events
            maybe_event = self.event_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                        match Self::convert_key(key_event) {
                            Some(key_input) => Ok(self.input_state.handle_key(key_input, app)),
                            None => Ok(vec![]),
                        }
                    },
                    Some(Ok(Event::Resize(cols, rows))) => {
                        Ok(app.handle(AppEvent::Resize(cols, rows)))
                    },
                    Some(Err(e)) => Err(TerminalError::Io(e)),
                    _ => Ok(vec![]),
                }
            }

            // Tick timeout
            () = tokio::time::sleep(TICK_INTERVAL) => {
                Ok(app.handle(AppEvent::Tick))
            }
        }
    }

    async fn connect(&mut self, endpoint: &str) -> Result<(), Self::Error> {
        let client = transport::connect(endpoint).await?;
        self.connection = Some(client);
        Ok(())
    }

    async fn send_frame(&mut self, frame: Frame) -> Result<(), Self::Error> {
        let conn = self.connection.as_ref().ok_or(TerminalError::NotConnected)?;
        conn.to_server.send(frame).await.map_err(|_| TerminalError::ChannelClosed)
    }

    async fn recv_event(&mut self) -> Option<TransportEvent> {
        self.connection.as_mut().and_then(|conn| conn.from_server.try_recv().ok())
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn render(&mut self, app: &App, session: &ConnectionController) -> Result<(), Self::Error> {
        self.terminal.draw(|frame| {
            ui::render(frame, app, session, &self.input_state);
        })?;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.shutdown().await;
            tracing::info!("connection released");
        }
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        if let Some(ref conn) = self.connection {
            conn.stop();
        }
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn shift_enter_is_distinct() {
        assert_eq!(
            TerminalDriver::convert_key(key(KeyCode::Enter, KeyModifiers::SHIFT)),
            Some(KeyInput::ShiftEnter)
        );
        assert_eq!(
            TerminalDriver::convert_key(key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(KeyInput::Enter)
        );
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(TerminalDriver::convert_key(key(KeyCode::Tab, KeyModifiers::NONE)), None);
        assert_eq!(TerminalDriver::convert_key(key(KeyCode::F(1), KeyModifiers::NONE)), None);
    }
}
