//! Raw events delivered by the protocol bridge.
//!
//! Only the event kinds the bot reacts to are modelled. Every other kind
//! (presence, receipts, history sync, labels...) deserializes to
//! [`RawEvent::Ignored`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Jid;

/// One protocol event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawEvent {
    /// Session connected and authenticated.
    Connected,

    /// Connection closed by the server.
    Disconnected,

    /// A new device pairing completed.
    PairSuccess { jid: Jid },

    /// The session was revoked; re-pairing needs a human.
    LoggedOut {
        #[serde(default)]
        reason: String,
    },

    /// Incoming 1:1 call.
    CallOffer { from: Jid, call_id: String },

    /// Incoming group call.
    CallOfferNotice { from: Jid, call_id: String },

    /// A message, either received or sent from one of our own devices.
    Message(RawMessage),

    #[serde(other)]
    Ignored,
}

/// Message event: routing metadata plus the protocol payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMessage {
    pub info: MessageInfo,
    #[serde(default)]
    pub message: Payload,
}

/// Routing metadata of a message event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    pub sender: Jid,
    /// Chat the message belongs to. For incoming 1:1 messages this is the
    /// remote party, not us.
    pub chat: Jid,
    #[serde(default)]
    pub is_from_me: bool,
    #[serde(default)]
    pub is_group: bool,
    /// Server-assigned send time.
    pub timestamp: DateTime<Utc>,
}

/// Message payload. At most one field is expected to be set, but nothing
/// enforces it; the classifier picks by priority.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_text: Option<ExtendedText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sticker: Option<StickerMessage>,
}

/// Text with formatting, link preview or a quoted message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtendedText {
    #[serde(default)]
    pub text: String,
    /// Quote/mention context, kept opaque and passed back on edits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_info: Option<Value>,
}

/// Image or video.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaMessage {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioMessage {
    #[serde(default)]
    pub seconds: Option<u32>,
    /// Push-to-talk voice note.
    #[serde(default)]
    pub ptt: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMessage {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StickerMessage {
    #[serde(default)]
    pub animated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_event_from_json() {
        let json = r#"{
            "type": "message",
            "info": {
                "id": "3EB0C767D26A1D1B",
                "sender": "6281234567890:4@s.whatsapp.net",
                "chat": "6281234567890@s.whatsapp.net",
                "timestamp": "2026-10-19T08:00:00Z"
            },
            "message": { "conversation": "hello" }
        }"#;

        let event: RawEvent = serde_json::from_str(json).unwrap();
        let RawEvent::Message(raw) = event else {
            panic!("expected message event");
        };
        assert_eq!(raw.info.id, "3EB0C767D26A1D1B");
        assert_eq!(raw.info.sender.device(), Some(4));
        assert!(!raw.info.is_from_me);
        assert_eq!(raw.message.conversation.as_deref(), Some("hello"));
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let event: RawEvent = serde_json::from_str(r#"{"type": "presence"}"#).unwrap();
        assert!(matches!(event, RawEvent::Ignored));
    }

    #[test]
    fn test_call_offer_from_json() {
        let json = r#"{"type": "call_offer", "from": "628111@s.whatsapp.net", "call_id": "C1"}"#;
        let event: RawEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, RawEvent::CallOffer { ref call_id, .. } if call_id == "C1"));
    }
}
