//! Background publisher: polls [`OutboxStore::fetch_unpublished`], delivers
//! to the [`EventBus`], and tracks retries/poison events (spec §4.1).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, warn};

use super::bus::EventBus;
use super::{OutboxError, OutboxStore};
use crate::config::OutboxConfig;

/// Counts events that have exceeded `max_retries_before_poison` and are
/// still unpublished. Exposed for a `/metrics` high-retries gauge (spec §4.1
/// "surfaced... via a high-retries metric").
#[derive(Default)]
pub struct PoisonCounter(AtomicU64);

impl PoisonCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Publisher {
    store: Arc<dyn OutboxStore>,
    bus: Arc<dyn EventBus>,
    config: OutboxConfig,
    poison_count: Arc<PoisonCounter>,
}

impl Publisher {
    pub fn new(store: Arc<dyn OutboxStore>, bus: Arc<dyn EventBus>, config: OutboxConfig) -> Self {
        Self {
            store,
            bus,
            config,
            poison_count: Arc::new(PoisonCounter::default()),
        }
    }

    pub fn poison_count(&self) -> Arc<PoisonCounter> {
        self.poison_count.clone()
    }

    /// Run the poll loop until `shutdown` resolves. Events are fetched
    /// oldest-first (per-aggregate creation-time order preserved by the
    /// store), so a single publisher instance never reorders an aggregate's
    /// own events even though cross-aggregate ordering is not promised.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.poll_interval());
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.drain_batch().await {
                        error!(error = %e, "outbox publisher batch failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("outbox publisher shutting down");
                        return;
                    }
                }
            }
        }
    }

    pub async fn drain_batch(&self) -> Result<(), OutboxError> {
        let batch = self.store.fetch_unpublished(self.config.batch_size).await?;
        for event in batch {
            match self.bus.publish(&event).await {
                Ok(()) => {
                    self.store.mark_published(event.id).await?;
                }
                Err(e) => {
                    let retries = event.retries + 1;
                    let next_retry_at = Utc::now()
                        + chrono::Duration::from_std(self.config.backoff_delay(retries)).unwrap_or(chrono::Duration::zero());
                    self.store.record_failure(event.id, e.to_string(), next_retry_at).await?;
                    if retries >= self.config.max_retries_before_poison {
                        self.poison_count.0.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            event_id = %event.id,
                            event_type = %event.event_type,
                            retries,
                            "poison event: exceeded max retries, still unpublished"
                        );
                    } else {
                        warn!(event_id = %event.id, retries, error = %e, "outbox publish failed, will retry");
                    }
                }
            }
        }
        Ok(())
    }
}
