//! Last-interaction record, one document per contact.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// When a contact last wrote to us.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Non-device chat identity (unique index)
    pub chat_jid: String,

    /// Timestamp of the latest incoming message
    pub last_message: mongodb::bson::DateTime,
}

impl InteractionRecord {
    pub fn new(chat_jid: impl Into<String>, last_message: DateTime<Utc>) -> Self {
        Self {
            id: None,
            chat_jid: chat_jid.into(),
            last_message: mongodb::bson::DateTime::from_millis(last_message.timestamp_millis()),
        }
    }

    /// Last message time as a chrono timestamp (millisecond precision).
    pub fn last_message_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_message.timestamp_millis()).unwrap_or_default()
    }
}
