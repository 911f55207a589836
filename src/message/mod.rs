//! Canonical message model.
//!
//! Every message event is turned into one [`Message`] by [`classify`]
//! before any handler sees it.

mod classify;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::protocol::{Jid, RawMessage};

pub use classify::classify;

/// What kind of payload a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Sticker,
    Unsupported,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Audio => "AUDIO",
            Self::Document => "DOCUMENT",
            Self::Sticker => "STICKER",
            Self::Unsupported => "UNSUPPORTED",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether we received the message or one of our devices sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incoming => "INCOMING",
            Self::Outgoing => "OUTGOING",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified message. Built once per event and never mutated.
///
/// `sender_key` and `recipient_key` are the non-device forms of the
/// identities, computed at construction. Comparisons and storage keys always
/// go through them.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub kind: MessageKind,
    pub direction: Direction,
    pub sender: Jid,
    pub sender_key: Jid,
    pub recipient: Jid,
    pub recipient_key: Jid,
    pub is_group: bool,
    pub is_newsletter_origin: bool,
    pub content: String,
    /// Remote send time, not local receipt time.
    pub timestamp: DateTime<Utc>,
    /// Original event, for operations that need protocol detail (edit).
    pub raw: Arc<RawMessage>,
}

impl Message {
    pub fn is_incoming(&self) -> bool {
        self.direction == Direction::Incoming
    }

    pub fn is_outgoing(&self) -> bool {
        self.direction == Direction::Outgoing
    }
}
