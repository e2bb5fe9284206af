//! Input state and key handling for the TUI.
//!
//! This module owns all text input state (buffer, cursor) and handles
//! character-level key events. Command parsing happens here on Enter.

use stompchat_app::{App, AppAction, KeyInput};

use crate::commands::{self, Command};

/// Text input line.
///
/// The cursor counts characters, not bytes, so multi-byte input edits
/// cleanly.
#[derive(Debug, Default)]
pub struct InputState {
    buffer: String,
    cursor: usize,
}

impl InputState {
    /// Create a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text in the input buffer.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Handle a key input event.
    ///
    /// Returns actions to process (may be empty for input-only keys,
    /// or contain session actions for a submitted line).
    pub fn handle_key(&mut self, key: KeyInput, app: &mut App) -> Vec<AppAction> {
        match key {
            KeyInput::Char(c) => {
                let at = self.byte_offset(self.cursor);
                self.buffer.insert(at, c);
                self.cursor = self.cursor.saturating_add(1);
                vec![AppAction::Render]
            },
            KeyInput::Backspace => {
                if self.cursor > 0 {
                    self.cursor = self.cursor.saturating_sub(1);
                    let at = self.byte_offset(self.cursor);
                    self.buffer.remove(at);
                }
                vec![AppAction::Render]
            },
            KeyInput::Delete => {
                if self.cursor < self.len() {
                    let at = self.byte_offset(self.cursor);
                    self.buffer.remove(at);
                }
                vec![AppAction::Render]
            },
            KeyInput::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                vec![AppAction::Render]
            },
            KeyInput::Right => {
                if self.cursor < self.len() {
                    self.cursor = self.cursor.saturating_add(1);
                }
                vec![AppAction::Render]
            },
            KeyInput::Home => {
                self.cursor = 0;
                vec![AppAction::Render]
            },
            KeyInput::End => {
                self.cursor = self.len();
                vec![AppAction::Render]
            },
            KeyInput::Enter => self.handle_enter(app),
            KeyInput::ShiftEnter => vec![],
            KeyInput::Esc => app.quit(),
        }
    }

    /// Handle Enter key - parse command and call App API.
    fn handle_enter(&mut self, app: &mut App) -> Vec<AppAction> {
        let text = std::mem::take(&mut self.buffer);
        self.cursor = 0;

        match commands::parse(&text) {
            Command::Quit => app.quit(),
            Command::Reconnect => app.reconnect(),
            Command::Message { content } => app.send_message(content),
        }
    }

    fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use stompchat_client::Identity;

    use super::*;

    fn app() -> App {
        App::new(Identity::new("Alice"), "ws://localhost:8080/ws/websocket".into())
    }

    fn type_text(input: &mut InputState, app: &mut App, text: &str) {
        for c in text.chars() {
            input.handle_key(KeyInput::Char(c), app);
        }
    }

    #[test]
    fn char_input_adds_to_buffer() {
        let mut input = InputState::new();
        let mut app = app();

        type_text(&mut input, &mut app, "hi");

        assert_eq!(input.buffer(), "hi");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn backspace_removes_char() {
        let mut input = InputState::new();
        let mut app = app();

        type_text(&mut input, &mut app, "ab");
        input.handle_key(KeyInput::Backspace, &mut app);

        assert_eq!(input.buffer(), "a");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn multibyte_editing() {
        let mut input = InputState::new();
        let mut app = app();

        type_text(&mut input, &mut app, "héllo");
        input.handle_key(KeyInput::Home, &mut app);
        input.handle_key(KeyInput::Right, &mut app);
        input.handle_key(KeyInput::Delete, &mut app);
        input.handle_key(KeyInput::Char('e'), &mut app);

        assert_eq!(input.buffer(), "hello");
        assert_eq!(input.cursor(), 2);
    }

    #[test]
    fn enter_sends_and_clears_buffer() {
        let mut input = InputState::new();
        let mut app = app();

        type_text(&mut input, &mut app, "test");
        let actions = input.handle_key(KeyInput::Enter, &mut app);

        assert_eq!(actions, vec![AppAction::SendMessage { text: "test".into() }, AppAction::Render]);
        assert!(input.buffer().is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn enter_on_blank_line_leaves_gating_to_session() {
        let mut input = InputState::new();
        let mut app = app();

        type_text(&mut input, &mut app, "   ");
        let actions = input.handle_key(KeyInput::Enter, &mut app);

        assert_eq!(actions, vec![AppAction::SendMessage { text: "   ".into() }, AppAction::Render]);
        assert!(input.buffer().is_empty());
    }

    #[test]
    fn shift_enter_does_not_submit() {
        let mut input = InputState::new();
        let mut app = app();

        type_text(&mut input, &mut app, "draft");
        let actions = input.handle_key(KeyInput::ShiftEnter, &mut app);

        assert!(actions.is_empty());
        assert_eq!(input.buffer(), "draft");
    }

    #[test]
    fn commands_map_to_app_api() {
        let mut input = InputState::new();
        let mut app = app();

        type_text(&mut input, &mut app, "/reconnect");
        let actions = input.handle_key(KeyInput::Enter, &mut app);
        assert_eq!(actions.first(), Some(&AppAction::Reconnect));

        type_text(&mut input, &mut app, "/quit");
        assert_eq!(input.handle_key(KeyInput::Enter, &mut app), vec![AppAction::Quit]);
        assert_eq!(input.handle_key(KeyInput::Esc, &mut app), vec![AppAction::Quit]);
    }

    #[test]
    fn cursor_movement() {
        let mut input = InputState::new();
        let mut app = app();

        type_text(&mut input, &mut app, "abc");

        input.handle_key(KeyInput::Home, &mut app);
        assert_eq!(input.cursor(), 0);

        input.handle_key(KeyInput::End, &mut app);
        assert_eq!(input.cursor(), 3);

        input.handle_key(KeyInput::Left, &mut app);
        assert_eq!(input.cursor(), 2);

        input.handle_key(KeyInput::Right, &mut app);
        input.handle_key(KeyInput::Right, &mut app);
        assert_eq!(input.cursor(), 3);
    }
}
