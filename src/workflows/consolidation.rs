//! ConsolidationWorkflow (spec §4.5.3, multi-item orders only).

use std::time::Duration;

use tokio::sync::mpsc;

use crate::clients::labor::{FindCapableStationsRequest, LaborClient};
use crate::domain::consolidation_unit::{ConsolidationStatus, ConsolidationUnit};
use crate::outbox::OutboxStore;

use super::activities::notify_customer;
use super::signals::{await_signal, Awaited};
use super::WorkflowError;

pub const SHORT_TIMEOUT: Duration = Duration::from_secs(20 * 60);

/// One `itemScanned` signal, tied to a source tote and destination bin
/// (spec §4.5.3). The bin/tote identifiers are carried for downstream event
/// emission; the unit itself only tracks the running count.
pub struct ItemScanned {
    pub source_tote: String,
    pub destination_bin: String,
}

/// Create a consolidation unit → assign station → receive `itemScanned`
/// until `expectedItems == receivedItems` or `shortTimeout` elapses → verify
/// → complete.
pub async fn run(
    mut unit: ConsolidationUnit,
    labor: &dyn LaborClient,
    outbox: &dyn OutboxStore,
    zone: &str,
    mut signals: mpsc::Receiver<ItemScanned>,
) -> Result<ConsolidationUnit, WorkflowError> {
    run_with_timeout(&mut unit, labor, zone, &mut signals, SHORT_TIMEOUT).await?;

    if unit.status == ConsolidationStatus::Completed {
        notify_customer(
            outbox,
            unit.order_id,
            "consolidation.completed",
            serde_json::json!({ "consolidationId": unit.consolidation_id, "receivedItems": unit.received_items }),
        )
        .await;
    }

    Ok(unit)
}

async fn run_with_timeout(
    unit: &mut ConsolidationUnit,
    labor: &dyn LaborClient,
    zone: &str,
    signals: &mut mpsc::Receiver<ItemScanned>,
    short_timeout: Duration,
) -> Result<(), WorkflowError> {
    let stations = labor
        .find_capable_stations(FindCapableStationsRequest {
            station_type: "consolidation".into(),
            zone: zone.to_string(),
            requirements: vec![],
        })
        .await?;
    if let Some(station_id) = stations.station_ids.into_iter().next() {
        unit.assign_station(station_id);
    }

    while !unit.is_complete() {
        match await_signal(signals, short_timeout).await {
            Awaited::Signal(_scanned) => unit.record_item_scanned(),
            Awaited::TimedOut => {
                unit.mark_short();
                return Ok(());
            }
        }
    }

    unit.verify();
    unit.complete();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::labor::{AssignTaskRequest, FindCapableStationsResponse, LaborError, Worker, WorkerQuery};
    use crate::domain::ids::{OrderId, StationId, WorkerId};
    use crate::outbox::OutboxError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingOutbox {
        events: Mutex<Vec<crate::outbox::OutboxEvent>>,
    }
    #[async_trait]
    impl OutboxStore for RecordingOutbox {
        async fn append(&self, event: crate::outbox::OutboxEvent) -> Result<(), OutboxError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
        async fn fetch_unpublished(&self, _batch_size: usize) -> Result<Vec<crate::outbox::OutboxEvent>, OutboxError> {
            Ok(vec![])
        }
        async fn mark_published(&self, _id: uuid::Uuid) -> Result<(), OutboxError> {
            Ok(())
        }
        async fn record_failure(&self, _id: uuid::Uuid, _error: String, _next_retry_at: chrono::DateTime<chrono::Utc>) -> Result<(), OutboxError> {
            Ok(())
        }
    }

    struct StubLabor(StationId);
    #[async_trait]
    impl LaborClient for StubLabor {
        async fn find_available(&self, _query: WorkerQuery) -> Result<Worker, LaborError> {
            Ok(Worker {
                worker_id: WorkerId::new(),
                name: "Bob".into(),
            })
        }
        async fn assign_task(&self, _worker_id: WorkerId, _req: AssignTaskRequest) -> Result<(), LaborError> {
            Ok(())
        }
        async fn find_capable_stations(
            &self,
            _req: FindCapableStationsRequest,
        ) -> Result<FindCapableStationsResponse, LaborError> {
            Ok(FindCapableStationsResponse {
                station_ids: vec![self.0],
            })
        }
    }

    #[tokio::test]
    async fn completes_once_all_items_scanned() {
        let unit = ConsolidationUnit::new(OrderId::new(), None, 2);
        let (tx, rx) = super::super::signals::channel(4);
        tx.send(ItemScanned {
            source_tote: "T1".into(),
            destination_bin: "B1".into(),
        })
        .await
        .unwrap();
        tx.send(ItemScanned {
            source_tote: "T2".into(),
            destination_bin: "B1".into(),
        })
        .await
        .unwrap();

        let outbox = RecordingOutbox::default();
        let result = run(unit, &StubLabor(StationId::new()), &outbox, "A", rx).await.unwrap();
        assert_eq!(
            result.status,
            crate::domain::consolidation_unit::ConsolidationStatus::Completed
        );
        assert_eq!(outbox.events.lock().unwrap()[0].event_type, "consolidation.completed");
    }

    #[tokio::test]
    async fn marks_short_on_timeout() {
        let mut unit = ConsolidationUnit::new(OrderId::new(), None, 2);
        let (_tx, mut rx) = super::super::signals::channel(4);
        run_with_timeout(&mut unit, &StubLabor(StationId::new()), "A", &mut rx, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(unit.status, crate::domain::consolidation_unit::ConsolidationStatus::Short);
    }
}
