//! Outbound operations against the chat protocol.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::Jid;

/// Errors returned by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bridge request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bridge returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid bridge url: {0}")]
    Url(#[from] url::ParseError),

    #[error("session is not paired")]
    NotPaired,
}

/// Content of a message we send or edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutgoingPayload {
    Conversation {
        text: String,
    },
    ExtendedText {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context_info: Option<Value>,
    },
}

impl OutgoingPayload {
    /// Plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Conversation { text: text.into() }
    }
}

/// Server acknowledgement of a send or edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub id: String,
    pub timestamp: DateTime<Utc>,
}

/// The operation set the bot needs from the protocol layer.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message to a chat.
    async fn send(&self, chat: &Jid, payload: OutgoingPayload) -> Result<Receipt, TransportError>;

    /// Replace the content of a message we sent earlier.
    async fn edit(
        &self,
        chat: &Jid,
        message_id: &str,
        payload: OutgoingPayload,
    ) -> Result<Receipt, TransportError>;

    /// Decline an incoming call.
    async fn reject_call(&self, caller: &Jid, call_id: &str) -> Result<(), TransportError>;

    /// Identity of the logged-in account, `None` before pairing.
    fn self_identity(&self) -> Option<Jid>;

    /// Re-read the logged-in identity from the protocol layer.
    async fn refresh_identity(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
