//! In-memory [`IdempotencyStore`] for the `dev` feature profile. Expired
//! locks are reclaimed lazily on the next `begin` for the same key, since
//! there is no TTL index to do it in the background (spec §4.2).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{BeginOutcome, IdempotencyError, IdempotencyPhase, IdempotencyRecord, IdempotencyStore, StoredResponse};

#[derive(Default)]
pub struct InMemoryIdempotencyStore {
    records: Mutex<HashMap<(String, String), IdempotencyRecord>>,
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn begin(
        &self,
        service_id: &str,
        key: &str,
        request_body_hash: &str,
        ttl_hours: i64,
    ) -> Result<BeginOutcome, IdempotencyError> {
        let now = Utc::now();
        let mut records = self.records.lock().unwrap();
        let map_key = (service_id.to_string(), key.to_string());

        if let Some(existing) = records.get(&map_key) {
            if existing.expires_at > now {
                if existing.request_body_hash != request_body_hash {
                    return Err(IdempotencyError::BodyMismatch(key.to_string()));
                }
                return match existing.phase {
                    IdempotencyPhase::Locked => Err(IdempotencyError::InFlight(key.to_string())),
                    IdempotencyPhase::Completed => Ok(BeginOutcome::Replay(
                        existing
                            .response
                            .clone()
                            .ok_or_else(|| IdempotencyError::Storage("completed record missing response".into()))?,
                    )),
                };
            }
        }

        records.insert(
            map_key,
            IdempotencyRecord {
                service_id: service_id.to_string(),
                key: key.to_string(),
                phase: IdempotencyPhase::Locked,
                request_body_hash: request_body_hash.to_string(),
                response: None,
                created_at: now,
                expires_at: now + chrono::Duration::hours(ttl_hours),
            },
        );
        Ok(BeginOutcome::Proceed)
    }

    async fn complete(&self, service_id: &str, key: &str, response: StoredResponse) -> Result<(), IdempotencyError> {
        let mut records = self.records.lock().unwrap();
        if let Some(record) = records.get_mut(&(service_id.to_string(), key.to_string())) {
            record.phase = IdempotencyPhase::Completed;
            record.response = Some(response);
        }
        Ok(())
    }

    async fn release(&self, service_id: &str, key: &str) -> Result<(), IdempotencyError> {
        self.records.lock().unwrap().remove(&(service_id.to_string(), key.to_string()));
        Ok(())
    }
}
