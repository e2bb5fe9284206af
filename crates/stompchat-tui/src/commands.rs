//! Slash-command parsing.
//!
//! Only two commands exist. Everything else, including unknown `/words`,
//! is chat text and goes to the broker unchanged.

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/quit`
    Quit,
    /// `/reconnect`
    Reconnect,
    /// Anything else.
    Message {
        /// Text exactly as typed.
        content: String,
    },
}

/// Parse one submitted line.
pub fn parse(input: &str) -> Command {
    match input.trim() {
        "/quit" => Command::Quit,
        "/reconnect" => Command::Reconnect,
        _ => Command::Message { content: input.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands() {
        assert_eq!(parse("/quit"), Command::Quit);
        assert_eq!(parse("  /reconnect "), Command::Reconnect);
    }

    #[test]
    fn unknown_command_is_chat() {
        assert_eq!(parse("/shrug"), Command::Message { content: "/shrug".into() });
    }

    #[test]
    fn text_is_kept_verbatim() {
        assert_eq!(parse("  hello  "), Command::Message { content: "  hello  ".into() });
    }
}
