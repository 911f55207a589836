//! Test doubles for the protocol boundary.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{
    DocumentMessage, ExtendedText, Jid, MediaMessage, MessageInfo, OutgoingPayload, Payload,
    RawMessage, Receipt, Transport, TransportError,
};

/// Transport that records every call instead of talking to a bridge.
#[derive(Default)]
pub struct RecordingTransport {
    identity: Mutex<Option<Jid>>,
    pub sends: Mutex<Vec<(Jid, OutgoingPayload)>>,
    pub edits: Mutex<Vec<(Jid, String, OutgoingPayload)>>,
    pub rejected_calls: Mutex<Vec<(Jid, String)>>,
    pub refreshes: Mutex<u32>,
    fail_sends: AtomicBool,
    fail_edits: AtomicBool,
}

impl RecordingTransport {
    pub fn new(identity: Option<Jid>) -> Self {
        Self {
            identity: Mutex::new(identity),
            ..Default::default()
        }
    }

    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn sent_to(&self) -> Vec<Jid> {
        self.sends.lock().iter().map(|(jid, _)| jid.clone()).collect()
    }

    fn failure() -> TransportError {
        TransportError::Status {
            status: 503,
            body: "bridge offline".to_string(),
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, chat: &Jid, payload: OutgoingPayload) -> Result<Receipt, TransportError> {
        self.sends.lock().push((chat.clone(), payload));
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(Receipt {
            id: format!("SENT{}", self.sends.lock().len()),
            timestamp: Utc::now(),
        })
    }

    async fn edit(
        &self,
        chat: &Jid,
        message_id: &str,
        payload: OutgoingPayload,
    ) -> Result<Receipt, TransportError> {
        self.edits
            .lock()
            .push((chat.clone(), message_id.to_string(), payload));
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(Receipt {
            id: format!("EDIT{}", self.edits.lock().len()),
            timestamp: Utc::now(),
        })
    }

    async fn reject_call(&self, caller: &Jid, call_id: &str) -> Result<(), TransportError> {
        self.rejected_calls
            .lock()
            .push((caller.clone(), call_id.to_string()));
        Ok(())
    }

    fn self_identity(&self) -> Option<Jid> {
        self.identity.lock().clone()
    }

    async fn refresh_identity(&self) -> Result<(), TransportError> {
        *self.refreshes.lock() += 1;
        Ok(())
    }
}

pub fn jid(s: &str) -> Jid {
    s.parse().unwrap()
}

pub fn raw_message(
    id: &str,
    sender: &str,
    chat: &str,
    from_me: bool,
    timestamp: DateTime<Utc>,
    message: Payload,
) -> RawMessage {
    let chat = jid(chat);
    RawMessage {
        info: MessageInfo {
            id: id.to_string(),
            sender: jid(sender),
            is_group: chat.is_group(),
            chat,
            is_from_me: from_me,
            timestamp,
        },
        message,
    }
}

pub fn text(body: &str) -> Payload {
    Payload {
        conversation: Some(body.to_string()),
        ..Default::default()
    }
}

pub fn extended_text(body: &str) -> Payload {
    Payload {
        extended_text: Some(ExtendedText {
            text: body.to_string(),
            context_info: Some(serde_json::json!({ "stanza_id": "QUOTED1" })),
        }),
        ..Default::default()
    }
}

pub fn image(caption: Option<&str>) -> Payload {
    Payload {
        image: Some(MediaMessage {
            caption: caption.map(str::to_string),
            mimetype: Some("image/jpeg".to_string()),
        }),
        ..Default::default()
    }
}

pub fn document(file_name: &str) -> Payload {
    Payload {
        document: Some(DocumentMessage {
            file_name: Some(file_name.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}
