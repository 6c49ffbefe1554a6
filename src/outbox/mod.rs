//! C1: Event & Outbox Substrate (spec §4.1).
//!
//! The write of new aggregate state and the append of [`OutboxEvent`] rows
//! happen in one transaction at the call site (in the storage layer); this
//! module owns the envelope shape, the store abstraction, the background
//! [`publisher::Publisher`], and the [`bus::EventBus`] it publishes to.

pub mod bus;
pub mod in_memory;
pub mod publisher;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CloudEvents-shaped envelope (spec §4.1): `{id, source, type, specversion,
/// time, subject, data}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxEvent {
    pub id: Uuid,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub specversion: String,
    pub time: DateTime<Utc>,
    pub subject: String,
    pub data: serde_json::Value,
    /// The aggregate this event belongs to. Used to preserve per-aggregate
    /// ordering by creation time within a single publisher instance.
    pub aggregate_id: String,
    pub published: bool,
    pub retries: u32,
    pub created_at: DateTime<Utc>,
    pub last_error: Option<String>,
    /// Earliest time the publisher should attempt this event again.
    /// Starts at `created_at` so a fresh event is eligible immediately;
    /// pushed forward on each failure per the exponential backoff in
    /// [`crate::config::OutboxConfig`] (spec §4.1).
    pub next_retry_at: DateTime<Utc>,
}

impl OutboxEvent {
    pub fn new(event_type: impl Into<String>, aggregate_id: impl Into<String>, subject: impl Into<String>, data: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source: "wes-core".to_string(),
            event_type: event_type.into(),
            specversion: "1.0".to_string(),
            time: now,
            subject: subject.into(),
            data,
            aggregate_id: aggregate_id.into(),
            published: false,
            retries: 0,
            created_at: now,
            last_error: None,
            next_retry_at: now,
        }
    }

    pub fn to_cloudevents(&self) -> cloudevents::Event {
        use cloudevents::{EventBuilder, EventBuilderV10};
        EventBuilderV10::new()
            .id(self.id.to_string())
            .source(self.source.clone())
            .ty(self.event_type.clone())
            .time(self.time)
            .subject(self.subject.clone())
            .data("application/json", self.data.clone())
            .build()
            .expect("envelope fields are always valid")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// The outbox's own persistence interface (spec §6.4: `outbox_events`
/// collection, indexed `(published, createdAt)`).
#[async_trait::async_trait]
pub trait OutboxStore: Send + Sync {
    async fn append(&self, event: OutboxEvent) -> Result<(), OutboxError>;
    /// Fetch up to `batch_size` unpublished events whose `next_retry_at` has
    /// elapsed, oldest first, grouped so that events for the same aggregate
    /// stay in creation order.
    async fn fetch_unpublished(&self, batch_size: usize) -> Result<Vec<OutboxEvent>, OutboxError>;
    async fn mark_published(&self, id: Uuid) -> Result<(), OutboxError>;
    /// Record a failed publish attempt: increments `retries`, stores `error`,
    /// and schedules the next attempt at `next_retry_at`.
    async fn record_failure(&self, id: Uuid, error: String, next_retry_at: DateTime<Utc>) -> Result<(), OutboxError>;
}
