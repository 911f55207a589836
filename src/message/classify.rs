//! Raw event → [`Message`] classification.

use std::sync::Arc;

use super::{Direction, Message, MessageKind};
use crate::protocol::{Jid, Payload, RawMessage};

const IMAGE_PLACEHOLDER: &str = "[IMAGE]";
const VIDEO_PLACEHOLDER: &str = "[VIDEO]";
const AUDIO_PLACEHOLDER: &str = "[AUDIO]";
const DOCUMENT_PLACEHOLDER: &str = "[DOCUMENT]";
const STICKER_PLACEHOLDER: &str = "[STICKER]";
const UNSUPPORTED_PLACEHOLDER: &str = "[UNSUPPORTED]";

/// Build the canonical message for a raw message event.
///
/// `self_identity` is the logged-in account. For incoming messages the
/// event's chat field names the remote party, so the recipient is replaced
/// with our own identity when it is known.
///
/// Never fails: payloads we do not understand become
/// [`MessageKind::Unsupported`] and are dropped later by the pipeline.
pub fn classify(raw: RawMessage, self_identity: Option<&Jid>) -> Message {
    let (kind, content) = classify_payload(&raw.message);

    let direction = if raw.info.is_from_me {
        Direction::Outgoing
    } else {
        Direction::Incoming
    };

    let sender = raw.info.sender.clone();
    let recipient = match (direction, self_identity) {
        (Direction::Incoming, Some(me)) => me.clone(),
        _ => raw.info.chat.clone(),
    };

    Message {
        id: raw.info.id.clone(),
        kind,
        direction,
        sender_key: sender.to_non_device(),
        recipient_key: recipient.to_non_device(),
        is_newsletter_origin: sender.is_newsletter(),
        sender,
        recipient,
        is_group: raw.info.is_group,
        content,
        timestamp: raw.info.timestamp,
        raw: Arc::new(raw),
    }
}

/// First matching payload wins, in this order: conversation, extended
/// text, image, video, audio, document, sticker.
fn classify_payload(payload: &Payload) -> (MessageKind, String) {
    if let Some(text) = payload.conversation.as_deref().filter(|t| !t.is_empty()) {
        return (MessageKind::Text, text.to_string());
    }

    if let Some(ext) = &payload.extended_text {
        return (MessageKind::Text, ext.text.clone());
    }

    if let Some(image) = &payload.image {
        return (MessageKind::Image, caption_or(image.caption.as_deref(), IMAGE_PLACEHOLDER));
    }

    if let Some(video) = &payload.video {
        return (MessageKind::Video, caption_or(video.caption.as_deref(), VIDEO_PLACEHOLDER));
    }

    // No transcription: audio is always the placeholder
    if payload.audio.is_some() {
        return (MessageKind::Audio, AUDIO_PLACEHOLDER.to_string());
    }

    if let Some(doc) = &payload.document {
        let name = doc
            .file_name
            .as_deref()
            .or(doc.title.as_deref())
            .filter(|n| !n.is_empty());
        let content = match name {
            Some(name) => format!("{} {}", DOCUMENT_PLACEHOLDER, name),
            None => DOCUMENT_PLACEHOLDER.to_string(),
        };
        return (MessageKind::Document, content);
    }

    if payload.sticker.is_some() {
        return (MessageKind::Sticker, STICKER_PLACEHOLDER.to_string());
    }

    (MessageKind::Unsupported, UNSUPPORTED_PLACEHOLDER.to_string())
}

fn caption_or(caption: Option<&str>, placeholder: &str) -> String {
    match caption.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => placeholder.to_string(),
    }
}
