//! Interaction store: contact → last interaction time.
//!
//! The greeting handler only needs two operations, so storage sits behind
//! [`InteractionStore`]. Production uses the MongoDB repository; the
//! in-memory store backs tests and dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;

use crate::protocol::Jid;

/// Storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

/// Durable last-interaction timestamps keyed by non-device chat identity.
///
/// Implementations must accept concurrent callers. Concurrent writes to the
/// same key resolve as last write wins.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Last recorded interaction, `None` when the contact is new.
    async fn last_interaction(&self, chat: &Jid) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Insert or replace the record for `chat`.
    async fn record_interaction(&self, chat: &Jid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryInteractionStore {
    data: Arc<DashMap<String, DateTime<Utc>>>,
}

impl MemoryInteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl InteractionStore for MemoryInteractionStore {
    async fn last_interaction(&self, chat: &Jid) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.data.get(&chat.to_string()).map(|entry| *entry))
    }

    async fn record_interaction(&self, chat: &Jid, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.data.insert(chat.to_string(), at);
        Ok(())
    }
}
