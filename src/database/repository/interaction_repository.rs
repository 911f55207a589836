//! MongoDB-backed interaction store.
//!
//! Read-through cache in front of the `chat_activity` collection. Every
//! incoming 1:1 message reads and writes one document, so hits on the cache
//! skip the read round trip.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::{IndexOptions, ReplaceOptions};
use mongodb::{Collection, IndexModel};
use tracing::{debug, info};

use crate::cache::{CacheConfig, TypedCache};
use crate::database::Database;
use crate::database::models::InteractionRecord;
use crate::database::store::{InteractionStore, StoreError};
use crate::protocol::Jid;

const COLLECTION: &str = "chat_activity";

/// Raw document access behind the repository cache.
#[async_trait]
pub trait InteractionBackend: Send + Sync {
    async fn find(&self, chat_jid: &str) -> Result<Option<InteractionRecord>, StoreError>;

    /// Insert or replace the document for `record.chat_jid`.
    async fn upsert(&self, record: &InteractionRecord) -> Result<(), StoreError>;
}

#[async_trait]
impl InteractionBackend for Collection<InteractionRecord> {
    async fn find(&self, chat_jid: &str) -> Result<Option<InteractionRecord>, StoreError> {
        Ok(self.find_one(doc! { "chat_jid": chat_jid }).await?)
    }

    async fn upsert(&self, record: &InteractionRecord) -> Result<(), StoreError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.replace_one(doc! { "chat_jid": &record.chat_jid }, record)
            .with_options(options)
            .await?;
        Ok(())
    }
}

/// Repository for last-interaction records.
pub struct InteractionRepository<B = Collection<InteractionRecord>> {
    backend: B,
    cache: TypedCache<String, DateTime<Utc>>,
}

impl InteractionRepository {
    pub fn new(db: &Database) -> Self {
        Self::with_backend(db.collection(COLLECTION))
    }

    /// Create the unique index on `chat_jid` if it does not exist.
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "chat_jid": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.backend.create_index(index).await?;
        info!(collection = COLLECTION, "Interaction index ensured");
        Ok(())
    }
}

impl<B> InteractionRepository<B> {
    fn with_backend(backend: B) -> Self {
        Self {
            backend,
            cache: TypedCache::new("interactions", CacheConfig::interactions()),
        }
    }
}

#[async_trait]
impl<B: InteractionBackend> InteractionStore for InteractionRepository<B> {
    async fn last_interaction(&self, chat: &Jid) -> Result<Option<DateTime<Utc>>, StoreError> {
        let key = chat.to_string();
        if let Some(at) = self.cache.get(&key) {
            return Ok(Some(at));
        }

        let result = self
            .backend
            .find(&key)
            .await?
            .map(|record| record.last_message_at());

        debug!("DB get interaction for {}: {:?}", key, result.is_some());

        if let Some(at) = result {
            self.cache.insert(key, at);
        }

        Ok(result)
    }

    async fn record_interaction(&self, chat: &Jid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let record = InteractionRecord::new(chat.to_string(), at);

        if let Err(e) = self.backend.upsert(&record).await {
            // Drop the cached value so the next read goes to the database
            self.cache.invalidate(&record.chat_jid);
            return Err(e);
        }

        self.cache.insert(record.chat_jid.clone(), record.last_message_at());
        debug!("Saved interaction for {}", record.chat_jid);

        Ok(())
    }
}
