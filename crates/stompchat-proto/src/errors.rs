//! Error types for frame and record decoding.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding wire data.
///
/// Decoding never panics; every malformed input maps to one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Command line is not a STOMP 1.2 command.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// Header line without a `:` separator.
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    /// Header contains an escape sequence STOMP 1.2 does not define.
    #[error("invalid escape sequence \\{0}")]
    InvalidEscape(char),

    /// Command or header bytes are not UTF-8.
    #[error("frame head is not valid UTF-8")]
    InvalidUtf8,

    /// `content-length` header is not a decimal byte count.
    #[error("invalid content-length: {0:?}")]
    InvalidContentLength(String),

    /// Body announced by `content-length` is not followed by a NUL octet.
    #[error("frame body is not terminated by NUL")]
    MissingNul,

    /// Body exceeds [`crate::Frame::MAX_BODY_SIZE`].
    #[error("frame body too large: {size} bytes (max {max})")]
    BodyTooLarge {
        /// Actual or announced body size
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// Input ended in the middle of a frame.
    #[error("frame truncated: {remaining} trailing bytes do not form a frame")]
    Truncated {
        /// Number of unconsumed bytes
        remaining: usize,
    },

    /// JSON body could not be (de)serialized.
    #[error("json error: {0}")]
    Json(String),

    /// JSON body is well-formed but is not a valid chat record.
    #[error("invalid chat record: {0}")]
    InvalidRecord(String),
}
