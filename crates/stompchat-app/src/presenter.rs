//! Message presentation.
//!
//! Maps one chat record to a frontend-neutral view model. Frontends decide
//! how a [`NoticeTone`] or a palette index turns into actual colors.

use stompchat_client::{ChatMessage, Identity};

/// Number of avatar colors a frontend must provide.
pub const AVATAR_PALETTE_SIZE: usize = 8;

/// How a presence notice is colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeTone {
    /// Someone joined.
    Joined,
    /// Someone left.
    Left,
}

/// Which side a chat block sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// Another participant's message.
    Left,
    /// Our own message, mirrored (avatar after the name).
    Right,
}

/// Sender badge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Avatar {
    /// Up to two uppercase letters, `?` for an empty name.
    pub initials: String,
    /// Index into a palette of [`AVATAR_PALETTE_SIZE`] colors.
    pub color: usize,
}

impl Avatar {
    /// Derive the badge for a sender name.
    pub fn for_name(name: &str) -> Self {
        let initials: String = name
            .split_whitespace()
            .take(2)
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect();

        let initials = if initials.is_empty() { "?".to_string() } else { initials };

        Self { initials, color: palette_index(name) }
    }
}

/// Header line of a chat block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageHeader {
    /// Sender name.
    pub sender: String,
    /// Sender badge.
    pub avatar: Avatar,
}

/// Display form of one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageView {
    /// Centered presence line.
    Notice {
        /// `"{sender} connected"` or `"{sender} disconnected"`.
        text: String,
        /// Join or leave.
        tone: NoticeTone,
    },
    /// Header plus message bubble.
    Chat {
        /// Sender and avatar.
        header: MessageHeader,
        /// Message body.
        content: String,
        /// Left for others, right for ourselves.
        alignment: Alignment,
    },
}

/// Present a record from the point of view of `identity`.
pub fn present(message: &ChatMessage, identity: &Identity) -> MessageView {
    match message {
        ChatMessage::Connect { sender } => {
            MessageView::Notice { text: format!("{sender} connected"), tone: NoticeTone::Joined }
        },
        ChatMessage::Disconnect { sender } => {
            MessageView::Notice { text: format!("{sender} disconnected"), tone: NoticeTone::Left }
        },
        ChatMessage::Chat { sender, content } => {
            let alignment =
                if identity == sender.as_str() { Alignment::Right } else { Alignment::Left };
            MessageView::Chat {
                header: MessageHeader { sender: sender.clone(), avatar: Avatar::for_name(sender) },
                content: content.clone(),
                alignment,
            }
        },
    }
}

/// FNV-1a, so the color survives toolchain upgrades.
fn palette_index(name: &str) -> usize {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let hash = name
        .bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME));

    (hash % AVATAR_PALETTE_SIZE as u64) as usize
}
