//! In-memory [`OutboxStore`] for the `dev` feature profile: a process-local
//! vector guarded by a mutex, no durability across restarts.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{OutboxError, OutboxEvent, OutboxStore};

#[derive(Default)]
pub struct InMemoryOutboxStore {
    events: Mutex<Vec<OutboxEvent>>,
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    async fn append(&self, event: OutboxEvent) -> Result<(), OutboxError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn fetch_unpublished(&self, batch_size: usize) -> Result<Vec<OutboxEvent>, OutboxError> {
        let now = Utc::now();
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !e.published && e.next_retry_at <= now)
            .take(batch_size)
            .cloned()
            .collect())
    }

    async fn mark_published(&self, id: Uuid) -> Result<(), OutboxError> {
        let mut events = self.events.lock().unwrap();
        if let Some(e) = events.iter_mut().find(|e| e.id == id) {
            e.published = true;
        }
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: String, next_retry_at: DateTime<Utc>) -> Result<(), OutboxError> {
        let mut events = self.events.lock().unwrap();
        if let Some(e) = events.iter_mut().find(|e| e.id == id) {
            e.retries += 1;
            e.last_error = Some(error);
            e.next_retry_at = next_retry_at;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appended_event_is_fetched_unpublished() {
        let store = InMemoryOutboxStore::default();
        let event = OutboxEvent::new("wms.packing.task-completed", "agg-1", "agg-1", serde_json::json!({}));
        let id = event.id;
        store.append(event).await.unwrap();
        let fetched = store.fetch_unpublished(10).await.unwrap();
        assert_eq!(fetched.len(), 1);
        store.mark_published(id).await.unwrap();
        assert!(store.fetch_unpublished(10).await.unwrap().is_empty());
    }
}
