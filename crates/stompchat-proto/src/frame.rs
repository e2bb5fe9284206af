//! STOMP 1.2 frames.
//!
//! A frame on the wire is:
//!
//! ```text
//! COMMAND\n
//! name:value\n      (zero or more headers)
//! \n
//! body\0
//! ```
//!
//! Header names and values are escaped (`\\`, `\n`, `\r`, `\c`) except in
//! `CONNECT` and `CONNECTED` frames. Bare end-of-line octets between frames
//! are heart-beats and are skipped by the decoder.

use std::{fmt, str::FromStr};

use bytes::{BufMut, Bytes};

use crate::errors::{ProtocolError, Result};

const NUL: u8 = 0;
const LF: u8 = b'\n';
const CR: u8 = b'\r';

/// Header carrying the body length in octets.
pub const CONTENT_LENGTH: &str = "content-length";

/// STOMP 1.2 frame commands (client and server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Client: open a session.
    Connect,
    /// Client: open a session (1.2 alias of CONNECT).
    Stomp,
    /// Server: session established.
    Connected,
    /// Client: publish to a destination.
    Send,
    /// Client: subscribe to a destination.
    Subscribe,
    /// Client: cancel a subscription.
    Unsubscribe,
    /// Client: acknowledge a message.
    Ack,
    /// Client: reject a message.
    Nack,
    /// Client: begin a transaction.
    Begin,
    /// Client: commit a transaction.
    Commit,
    /// Client: abort a transaction.
    Abort,
    /// Client: graceful shutdown.
    Disconnect,
    /// Server: message delivered on a subscription.
    Message,
    /// Server: receipt for a client frame.
    Receipt,
    /// Server: error, after which the server closes the connection.
    Error,
}

impl Command {
    /// Wire name of the command.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Stomp => "STOMP",
            Self::Connected => "CONNECTED",
            Self::Send => "SEND",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Ack => "ACK",
            Self::Nack => "NACK",
            Self::Begin => "BEGIN",
            Self::Commit => "COMMIT",
            Self::Abort => "ABORT",
            Self::Disconnect => "DISCONNECT",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
        }
    }

    /// Whether header escaping applies to this command.
    ///
    /// `CONNECT` and `CONNECTED` frames are exempt for compatibility with
    /// STOMP 1.0 peers.
    pub fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        let command = match s {
            "CONNECT" => Self::Connect,
            "STOMP" => Self::Stomp,
            "CONNECTED" => Self::Connected,
            "SEND" => Self::Send,
            "SUBSCRIBE" => Self::Subscribe,
            "UNSUBSCRIBE" => Self::Unsubscribe,
            "ACK" => Self::Ack,
            "NACK" => Self::Nack,
            "BEGIN" => Self::Begin,
            "COMMIT" => Self::Commit,
            "ABORT" => Self::Abort,
            "DISCONNECT" => Self::Disconnect,
            "MESSAGE" => Self::Message,
            "RECEIPT" => Self::Receipt,
            "ERROR" => Self::Error,
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single STOMP frame.
///
/// Headers keep their wire order. Repeated headers are preserved; lookups via
/// [`Frame::header`] return the first occurrence, as STOMP 1.2 requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame command.
    pub command: Command,
    /// Headers in wire order (unescaped).
    pub headers: Vec<(String, String)>,
    /// Raw body bytes.
    pub body: Bytes,
}

impl Frame {
    /// Maximum accepted body size (1 MiB).
    pub const MAX_BODY_SIZE: usize = 1024 * 1024;

    /// Create a frame with no headers and an empty body.
    pub fn new(command: Command) -> Self {
        Self { command, headers: Vec::new(), body: Bytes::new() }
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replace the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of the named header. `None` if absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    /// Body as UTF-8 (lossy).
    pub fn body_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Encode the frame into `dst`.
    ///
    /// A `content-length` header is emitted for non-empty bodies unless the
    /// caller already supplied one.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::BodyTooLarge` if the body exceeds
    ///   [`Frame::MAX_BODY_SIZE`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        if self.body.len() > Self::MAX_BODY_SIZE {
            return Err(ProtocolError::BodyTooLarge {
                size: self.body.len(),
                max: Self::MAX_BODY_SIZE,
            });
        }

        let escape = self.command.escapes_headers();

        dst.put_slice(self.command.as_str().as_bytes());
        dst.put_u8(LF);

        for (name, value) in &self.headers {
            put_header_part(dst, name, escape);
            dst.put_u8(b':');
            put_header_part(dst, value, escape);
            dst.put_u8(LF);
        }

        if !self.body.is_empty() && self.header(CONTENT_LENGTH).is_none() {
            dst.put_slice(CONTENT_LENGTH.as_bytes());
            dst.put_u8(b':');
            dst.put_slice(self.body.len().to_string().as_bytes());
            dst.put_u8(LF);
        }

        dst.put_u8(LF);
        dst.put_slice(&self.body);
        dst.put_u8(NUL);

        Ok(())
    }

    /// Encode the frame into a fresh buffer.
    ///
    /// # Errors
    ///
    /// See [`Frame::encode`].
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.body.len().saturating_add(64));
        self.encode(&mut buf)?;
        Ok(buf)
    }

    /// Decode one frame from the start of `bytes`.
    ///
    /// Leading heart-beats (bare EOLs) are skipped. Returns the frame and the
    /// number of bytes consumed, or `None` if `bytes` holds only heart-beats
    /// or an incomplete frame.
    ///
    /// # Errors
    ///
    /// Returns a `ProtocolError` for any structurally invalid frame. Never
    /// panics on arbitrary input.
    pub fn decode(bytes: &[u8]) -> Result<Option<(Self, usize)>> {
        let mut pos = skip_heartbeats(bytes, 0);
        if pos >= bytes.len() {
            return Ok(None);
        }

        let Some((command_line, next)) = read_line(bytes, pos)? else {
            return Ok(None);
        };
        let command: Command = command_line.parse()?;
        pos = next;

        let mut headers = Vec::new();
        loop {
            let Some((line, next)) = read_line(bytes, pos)? else {
                return Ok(None);
            };
            pos = next;

            if line.is_empty() {
                break;
            }

            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| ProtocolError::MalformedHeader(line.to_string()))?;

            if command.escapes_headers() {
                headers.push((unescape(name)?, unescape(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let content_length = headers
            .iter()
            .find(|(n, _)| n == CONTENT_LENGTH)
            .map(|(_, v)| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|_| ProtocolError::InvalidContentLength(v.clone()))
            })
            .transpose()?;

        let remaining = bytes.get(pos..).unwrap_or_default();

        let body_len = match content_length {
            Some(len) => {
                if len > Self::MAX_BODY_SIZE {
                    return Err(ProtocolError::BodyTooLarge { size: len, max: Self::MAX_BODY_SIZE });
                }
                match remaining.get(len) {
                    None => return Ok(None),
                    Some(&NUL) => len,
                    Some(_) => return Err(ProtocolError::MissingNul),
                }
            },
            None => match remaining.iter().position(|&b| b == NUL) {
                Some(len) if len > Self::MAX_BODY_SIZE => {
                    return Err(ProtocolError::BodyTooLarge { size: len, max: Self::MAX_BODY_SIZE });
                },
                Some(len) => len,
                None if remaining.len() > Self::MAX_BODY_SIZE => {
                    return Err(ProtocolError::BodyTooLarge {
                        size: remaining.len(),
                        max: Self::MAX_BODY_SIZE,
                    });
                },
                None => return Ok(None),
            },
        };

        let body = Bytes::copy_from_slice(remaining.get(..body_len).unwrap_or_default());

        // body + NUL
        let consumed = pos.saturating_add(body_len).saturating_add(1);

        Ok(Some((Self { command, headers, body }, consumed)))
    }

    /// Decode every frame in `bytes`.
    ///
    /// Used for WebSocket messages, which carry whole frames (possibly
    /// several, possibly only heart-beats).
    ///
    /// # Errors
    ///
    /// - Any error from [`Frame::decode`]
    /// - `ProtocolError::Truncated` if trailing bytes do not form a frame
    pub fn decode_all(bytes: &[u8]) -> Result<Vec<Self>> {
        let mut frames = Vec::new();
        let mut offset = 0;

        while offset < bytes.len() {
            let rest = bytes.get(offset..).unwrap_or_default();
            match Self::decode(rest)? {
                Some((frame, consumed)) => {
                    frames.push(frame);
                    offset = offset.saturating_add(consumed);
                },
                None => {
                    let tail = skip_heartbeats(rest, 0);
                    if tail < rest.len() {
                        return Err(ProtocolError::Truncated { remaining: rest.len() - tail });
                    }
                    break;
                },
            }
        }

        Ok(frames)
    }
}

fn skip_heartbeats(bytes: &[u8], mut pos: usize) -> usize {
    while let Some(&b) = bytes.get(pos) {
        if b == LF || (b == CR && bytes.get(pos.saturating_add(1)) == Some(&LF)) {
            pos = pos.saturating_add(1);
        } else {
            break;
        }
    }
    pos
}

/// Read one EOL-terminated line starting at `pos`.
///
/// Returns the line without its EOL and the offset just past it, or `None`
/// if no EOL follows.
fn read_line(bytes: &[u8], pos: usize) -> Result<Option<(&str, usize)>> {
    let Some(rest) = bytes.get(pos..) else {
        return Ok(None);
    };
    let Some(len) = rest.iter().position(|&b| b == LF) else {
        return Ok(None);
    };

    let raw = rest.get(..len).unwrap_or_default();
    let raw = raw.strip_suffix(&[CR]).unwrap_or(raw);
    let line = std::str::from_utf8(raw).map_err(|_| ProtocolError::InvalidUtf8)?;

    Ok(Some((line, pos.saturating_add(len).saturating_add(1))))
}

fn put_header_part(dst: &mut impl BufMut, text: &str, escape: bool) {
    if !escape {
        dst.put_slice(text.as_bytes());
        return;
    }

    for c in text.chars() {
        match c {
            '\\' => dst.put_slice(b"\\\\"),
            '\n' => dst.put_slice(b"\\n"),
            '\r' => dst.put_slice(b"\\r"),
            ':' => dst.put_slice(b"\\c"),
            c => {
                let mut utf8 = [0u8; 4];
                dst.put_slice(c.encode_utf8(&mut utf8).as_bytes());
            },
        }
    }
}

fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            Some(other) => return Err(ProtocolError::InvalidEscape(other)),
            None => return Err(ProtocolError::InvalidEscape(' ')),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_one(bytes: &[u8]) -> Frame {
        match Frame::decode(bytes) {
            Ok(Some((frame, _))) => frame,
            other => panic!("expected a frame, got {other:?}"),
        }
    }

    #[test]
    fn encode_send_frame() {
        let frame = Frame::new(Command::Send)
            .with_header("destination", "/app/chat.send-message")
            .with_body(&b"{}"[..]);

        let wire = frame.to_vec().unwrap();
        assert_eq!(
            wire,
            b"SEND\ndestination:/app/chat.send-message\ncontent-length:2\n\n{}\0".to_vec()
        );
    }

    #[test]
    fn decode_connected_frame() {
        let frame = decode_one(b"CONNECTED\nversion:1.2\nheart-beat:0,0\n\n\0");

        assert_eq!(frame.command, Command::Connected);
        assert_eq!(frame.header("version"), Some("1.2"));
        assert!(frame.body.is_empty());
    }

    #[test]
    fn decode_accepts_crlf_line_endings() {
        let frame = decode_one(b"MESSAGE\r\ndestination:/topic/public\r\n\r\nhi\0");

        assert_eq!(frame.command, Command::Message);
        assert_eq!(frame.header("destination"), Some("/topic/public"));
        assert_eq!(&frame.body[..], b"hi");
    }

    #[test]
    fn decode_skips_heartbeats() {
        let (frame, consumed) = Frame::decode(b"\n\r\n\nRECEIPT\nreceipt-id:1\n\n\0").unwrap().unwrap();

        assert_eq!(frame.command, Command::Receipt);
        assert_eq!(consumed, 4 + "RECEIPT\nreceipt-id:1\n\n\0".len());
    }

    #[test]
    fn heartbeat_only_yields_nothing() {
        assert_eq!(Frame::decode(b"\n\n").unwrap(), None);
        assert!(Frame::decode_all(b"\n").unwrap().is_empty());
    }

    #[test]
    fn header_escaping_round_trips() {
        let frame = Frame::new(Command::Send).with_header("a:b", "line\nbreak\\slash\rcr");
        let wire = frame.to_vec().unwrap();

        assert!(wire.starts_with(b"SEND\na\\cb:line\\nbreak\\\\slash\\rcr\n"));
        assert_eq!(decode_one(&wire), frame);
    }

    #[test]
    fn connect_headers_are_not_escaped() {
        let frame = decode_one(b"CONNECTED\nserver:broker\\x\n\n\0");
        assert_eq!(frame.header("server"), Some("broker\\x"));
    }

    #[test]
    fn first_repeated_header_wins() {
        let frame = decode_one(b"MESSAGE\nfoo:first\nfoo:second\n\n\0");
        assert_eq!(frame.header("foo"), Some("first"));
        assert_eq!(frame.headers.len(), 2);
    }

    #[test]
    fn content_length_allows_nul_in_body() {
        let frame = decode_one(b"SEND\ncontent-length:3\n\na\0b\0");
        assert_eq!(&frame.body[..], b"a\0b");
    }

    #[test]
    fn reject_unknown_command() {
        assert!(matches!(
            Frame::decode(b"HELLO\n\n\0"),
            Err(ProtocolError::UnknownCommand(cmd)) if cmd == "HELLO"
        ));
    }

    #[test]
    fn reject_header_without_colon() {
        assert!(matches!(
            Frame::decode(b"SEND\nnocolon\n\n\0"),
            Err(ProtocolError::MalformedHeader(_))
        ));
    }

    #[test]
    fn reject_undefined_escape() {
        assert_eq!(Frame::decode(b"SEND\na:\\t\n\n\0"), Err(ProtocolError::InvalidEscape('t')));
    }

    #[test]
    fn reject_missing_nul_after_content_length() {
        assert_eq!(Frame::decode(b"SEND\ncontent-length:1\n\nab\0"), Err(ProtocolError::MissingNul));
    }

    #[test]
    fn reject_bad_content_length() {
        assert!(matches!(
            Frame::decode(b"SEND\ncontent-length:abc\n\n\0"),
            Err(ProtocolError::InvalidContentLength(_))
        ));
    }

    #[test]
    fn incomplete_frame_is_pending() {
        assert_eq!(Frame::decode(b"SEND\ndestination:/x\n").unwrap(), None);
        assert_eq!(Frame::decode(b"SEND\ncontent-length:5\n\nab").unwrap(), None);
    }

    #[test]
    fn decode_all_reports_truncation() {
        let result = Frame::decode_all(b"RECEIPT\nreceipt-id:1\n\n\0SEND\n");
        assert_eq!(result, Err(ProtocolError::Truncated { remaining: 5 }));
    }

    #[test]
    fn decode_all_reads_batched_frames() {
        let frames = Frame::decode_all(b"RECEIPT\nreceipt-id:1\n\n\0\nRECEIPT\nreceipt-id:2\n\n\0\n")
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].header("receipt-id"), Some("2"));
    }
}
