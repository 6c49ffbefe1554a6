//! Mongo-backed [`IdempotencyStore`] (spec §4.2, §6.4): a unique index on
//! `(service_id, key)` makes `begin()`'s insert the mutex itself — a
//! duplicate-key error means another request already holds the lock — and a
//! TTL index on `expires_at` reclaims abandoned locks after 24h.

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::idempotency::{
    BeginOutcome, IdempotencyError, IdempotencyPhase, IdempotencyRecord, IdempotencyStore, StoredResponse,
};

const COLLECTION: &str = "idempotency_keys";

pub struct MongoIdempotencyStore {
    records: Collection<IdempotencyRecord>,
}

impl MongoIdempotencyStore {
    pub async fn new(database: &Database) -> Result<Self, IdempotencyError> {
        let records = database.collection(COLLECTION);
        let store = Self { records };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), IdempotencyError> {
        let unique_key = IndexModel::builder()
            .keys(doc! { "service_id": 1, "key": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.records
            .create_index(unique_key)
            .await
            .map_err(|e| IdempotencyError::Storage(e.to_string()))?;
        let ttl = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(IndexOptions::builder().expire_after(std::time::Duration::from_secs(0)).build())
            .build();
        self.records
            .create_index(ttl)
            .await
            .map_err(|e| IdempotencyError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl IdempotencyStore for MongoIdempotencyStore {
    async fn begin(
        &self,
        service_id: &str,
        key: &str,
        request_body_hash: &str,
        ttl_hours: i64,
    ) -> Result<BeginOutcome, IdempotencyError> {
        let now = Utc::now();
        let record = IdempotencyRecord {
            service_id: service_id.to_string(),
            key: key.to_string(),
            phase: IdempotencyPhase::Locked,
            request_body_hash: request_body_hash.to_string(),
            response: None,
            created_at: now,
            expires_at: now + chrono::Duration::hours(ttl_hours),
        };

        match self.records.insert_one(&record).await {
            Ok(_) => Ok(BeginOutcome::Proceed),
            Err(e) if is_duplicate_key(&e) => {
                let existing = self
                    .records
                    .find_one(doc! { "service_id": service_id, "key": key })
                    .await
                    .map_err(|e| IdempotencyError::Storage(e.to_string()))?
                    .ok_or_else(|| IdempotencyError::Storage("duplicate key vanished before re-read".into()))?;

                if existing.request_body_hash != request_body_hash {
                    return Err(IdempotencyError::BodyMismatch(key.to_string()));
                }
                match existing.phase {
                    IdempotencyPhase::Locked => Err(IdempotencyError::InFlight(key.to_string())),
                    IdempotencyPhase::Completed => Ok(BeginOutcome::Replay(
                        existing
                            .response
                            .ok_or_else(|| IdempotencyError::Storage("completed record missing response".into()))?,
                    )),
                }
            }
            Err(e) => Err(IdempotencyError::Storage(e.to_string())),
        }
    }

    async fn complete(&self, service_id: &str, key: &str, response: StoredResponse) -> Result<(), IdempotencyError> {
        self.records
            .update_one(
                doc! { "service_id": service_id, "key": key },
                doc! { "$set": {
                    "phase": "completed",
                    "response": mongodb::bson::to_bson(&response)
                        .map_err(|e| IdempotencyError::Storage(e.to_string()))?,
                } },
            )
            .await
            .map_err(|e| IdempotencyError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn release(&self, service_id: &str, key: &str) -> Result<(), IdempotencyError> {
        self.records
            .delete_one(doc! { "service_id": service_id, "key": key })
            .await
            .map_err(|e| IdempotencyError::Storage(e.to_string()))?;
        Ok(())
    }
}

fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(ref write_err)) = *error.kind {
        return write_err.code == 11000;
    }
    false
}
