//! GiftWrapWorkflow (spec §4.5.4, conditional on `giftWrap`).

use std::time::Duration;

use tokio::sync::mpsc;

use crate::clients::labor::{AssignTaskRequest, FindCapableStationsRequest, LaborClient};
use crate::domain::ids::OrderId;
use crate::domain::order::GiftWrapDetails;
use crate::execution_plan::worker_assignment::assign_worker;
use crate::outbox::OutboxStore;

use super::activities::notify_customer;
use super::signals::{await_signal, Awaited};
use super::WorkflowError;

pub const GIFT_WRAP_TIMEOUT: Duration = Duration::from_secs(20 * 60);

pub struct GiftWrapCompleted;

/// Find a `gift_wrap`-capable station, assign a certified worker, await
/// `giftWrapCompleted` (20 min timeout); apply the message card if present
/// (spec §4.5.4).
#[allow(clippy::too_many_arguments)]
pub async fn run(
    order_id: OrderId,
    labor: &dyn LaborClient,
    outbox: &dyn OutboxStore,
    zone: &str,
    details: Option<GiftWrapDetails>,
    signals: mpsc::Receiver<GiftWrapCompleted>,
) -> Result<Option<GiftWrapDetails>, WorkflowError> {
    run_with_timeout(order_id, labor, outbox, zone, details, signals, GIFT_WRAP_TIMEOUT).await
}

#[allow(clippy::too_many_arguments)]
async fn run_with_timeout(
    order_id: OrderId,
    labor: &dyn LaborClient,
    outbox: &dyn OutboxStore,
    zone: &str,
    details: Option<GiftWrapDetails>,
    mut signals: mpsc::Receiver<GiftWrapCompleted>,
    timeout: Duration,
) -> Result<Option<GiftWrapDetails>, WorkflowError> {
    let stations = labor
        .find_capable_stations(FindCapableStationsRequest {
            station_type: "gift_wrap".into(),
            zone: zone.to_string(),
            requirements: vec!["gift_wrap".into()],
        })
        .await?;
    let _station = stations.station_ids.into_iter().next();

    let worker_id = assign_worker(labor, "gift_wrap", zone, &["gift_wrap_certified".to_string()]).await?;
    labor
        .assign_task(
            worker_id,
            AssignTaskRequest {
                task_id: uuid::Uuid::new_v4().to_string(),
            },
        )
        .await?;

    match await_signal(&mut signals, timeout).await {
        Awaited::Signal(GiftWrapCompleted) => {
            notify_customer(outbox, order_id, "gift_wrap.completed", serde_json::json!({})).await;
            Ok(details)
        }
        Awaited::TimedOut => Err(WorkflowError::TimedOut("GiftWrapWorkflow", "giftWrapCompleted")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::labor::{FindCapableStationsResponse, LaborError, Worker, WorkerQuery};
    use crate::domain::ids::WorkerId;
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

    struct StubLabor;
    #[async_trait]
    impl LaborClient for StubLabor {
        async fn find_available(&self, _query: WorkerQuery) -> Result<Worker, LaborError> {
            Ok(Worker {
                worker_id: WorkerId::new(),
                name: "Carol".into(),
            })
        }
        async fn assign_task(&self, _worker_id: WorkerId, _req: AssignTaskRequest) -> Result<(), LaborError> {
            Ok(())
        }
        async fn find_capable_stations(
            &self,
            _req: FindCapableStationsRequest,
        ) -> Result<FindCapableStationsResponse, LaborError> {
            Ok(FindCapableStationsResponse { station_ids: vec![] })
        }
    }

    #[tokio::test]
    async fn completed_signal_returns_details() {
        let (tx, rx) = super::super::signals::channel(1);
        tx.send(GiftWrapCompleted).await.unwrap();
        let details = Some(GiftWrapDetails {
            message: Some("Happy birthday".into()),
            wrap_style: None,
        });
        let outbox = RecordingOutbox::default();
        let result = run(OrderId::new(), &StubLabor, &outbox, "A", details.clone(), rx).await.unwrap();
        assert_eq!(result, details);
        assert_eq!(outbox.events.lock().unwrap()[0].event_type, "gift_wrap.completed");
    }

    #[tokio::test]
    async fn timeout_without_completion() {
        let (_tx, rx) = super::super::signals::channel(1);
        let outbox = RecordingOutbox::default();
        let err = run_with_timeout(OrderId::new(), &StubLabor, &outbox, "A", None, rx, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::TimedOut(_, "giftWrapCompleted")));
    }
}
