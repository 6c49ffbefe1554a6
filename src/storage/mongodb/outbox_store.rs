//! Mongo-backed [`OutboxStore`] (spec §6.4: `outbox_events` collection,
//! indexed `(published, createdAt)`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use uuid::Uuid;

use crate::outbox::{OutboxError, OutboxEvent, OutboxStore};

const COLLECTION: &str = "outbox_events";

pub struct MongoOutboxStore {
    events: Collection<OutboxEvent>,
}

impl MongoOutboxStore {
    pub async fn new(database: &Database) -> Result<Self, OutboxError> {
        let events = database.collection(COLLECTION);
        let store = Self { events };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), OutboxError> {
        let index = IndexModel::builder()
            .keys(doc! { "published": 1, "next_retry_at": 1, "created_at": 1 })
            .options(IndexOptions::builder().build())
            .build();
        self.events
            .create_index(index)
            .await
            .map_err(|e| OutboxError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for MongoOutboxStore {
    async fn append(&self, event: OutboxEvent) -> Result<(), OutboxError> {
        self.events
            .insert_one(event)
            .await
            .map_err(|e| OutboxError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn fetch_unpublished(&self, batch_size: usize) -> Result<Vec<OutboxEvent>, OutboxError> {
        let now = mongodb::bson::to_bson(&Utc::now()).map_err(|e| OutboxError::Storage(e.to_string()))?;
        let filter = doc! { "published": false, "next_retry_at": { "$lte": now } };
        let options = FindOptions::builder()
            .sort(doc! { "aggregate_id": 1, "created_at": 1 })
            .limit(batch_size as i64)
            .build();
        let mut cursor = self
            .events
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| OutboxError::Storage(e.to_string()))?;

        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| OutboxError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| OutboxError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), OutboxError> {
        self.events
            .update_one(doc! { "id": id.to_string() }, doc! { "$set": { "published": true } })
            .await
            .map_err(|e| OutboxError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: String, next_retry_at: DateTime<Utc>) -> Result<(), OutboxError> {
        let next_retry_at = mongodb::bson::to_bson(&next_retry_at).map_err(|e| OutboxError::Storage(e.to_string()))?;
        self.events
            .update_one(
                doc! { "id": id.to_string() },
                doc! { "$inc": { "retries": 1 }, "$set": { "last_error": error, "next_retry_at": next_retry_at } },
            )
            .await
            .map_err(|e| OutboxError::Storage(e.to_string()))?;
        Ok(())
    }
}
