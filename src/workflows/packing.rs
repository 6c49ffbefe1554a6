//! PackingWorkflow (spec §4.5.5, seven sub-steps).

use tokio::sync::mpsc;

use crate::clients::labor::LaborClient;
use crate::domain::order::LineItem;
use crate::domain::pack_task::{select_packaging_material, Package, PackTask, PackageDimensions, ShippingLabel};
use crate::execution_plan::worker_assignment::assign_worker;
use crate::outbox::OutboxStore;

use super::activities::notify_customer;
use super::WorkflowError;

pub struct ItemVerified {
    pub sku: String,
}

/// 1. CreatePackTask (the caller passes `task` already constructed) →
/// 2. SelectPackagingMaterials → 3. PackItems (await `itemVerified` per item)
/// → 4. WeighPackage (`dimensions`/weight supplied by the scale/dimensioner
/// activity, here `dimensions` and `items`' weights) → 5.
/// GenerateShippingLabel → 6. ApplyLabelToPackage → 7. SealPackage (spec
/// §4.5.5). The channel closing before every item is verified surfaces as
/// [`crate::domain::pack_task::PackTaskError::ItemsNotVerified`] when
/// `seal()` is attempted.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    mut task: PackTask,
    labor: &dyn LaborClient,
    outbox: &dyn OutboxStore,
    zone: &str,
    items: &[LineItem],
    oversized_threshold_kg: f64,
    dimensions: PackageDimensions,
    carrier: &str,
    mut signals: mpsc::Receiver<ItemVerified>,
) -> Result<PackTask, WorkflowError> {
    let worker_id = assign_worker(labor, "pack", zone, &[]).await?;
    task.assign(worker_id);

    let package_type = select_packaging_material(items, oversized_threshold_kg);

    while !task.all_items_verified() {
        match signals.recv().await {
            Some(ItemVerified { sku }) => task.verify_item(&sku),
            None => break,
        }
    }

    let total_weight: f64 = items.iter().map(|i| i.weight * i.quantity as f64).sum();
    task.set_package(Package {
        package_type,
        dimensions,
        total_weight,
        sealed: false,
    })?;

    task.apply_label(ShippingLabel {
        tracking_number: uuid::Uuid::new_v4().to_string(),
        carrier: carrier.to_string(),
        applied_at: chrono::Utc::now(),
    })?;

    task.seal()?;
    task.complete()?;

    notify_customer(
        outbox,
        task.order_id,
        "packing.completed",
        serde_json::json!({ "taskId": task.task_id }),
    )
    .await;

    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::labor::{AssignTaskRequest, FindCapableStationsRequest, FindCapableStationsResponse, LaborError, Worker, WorkerQuery};
    use crate::domain::ids::{OrderId, WorkerId};
    use crate::domain::pack_task::PackItem;
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
                name: "Dave".into(),
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

    fn dims() -> PackageDimensions {
        PackageDimensions {
            length_cm: 20.0,
            width_cm: 15.0,
            height_cm: 10.0,
        }
    }

    #[tokio::test]
    async fn completes_once_all_items_verified() {
        let task = PackTask::new(
            OrderId::new(),
            vec![PackItem {
                sku: "SKU-1".into(),
                quantity: 1,
                verified: false,
            }],
        );
        let items = vec![LineItem {
            sku: "SKU-1".into(),
            quantity: 1,
            weight: 0.5,
            is_fragile: false,
            is_hazmat: false,
            requires_cold_chain: false,
            unit_price: 10.0,
        }];
        let (tx, rx) = super::super::signals::channel(1);
        tx.send(ItemVerified { sku: "SKU-1".into() }).await.unwrap();
        drop(tx);

        let outbox = RecordingOutbox::default();
        let task = run(task, &StubLabor, &outbox, "A", &items, 30.0, dims(), "ups", rx).await.unwrap();
        assert_eq!(task.status, crate::domain::pack_task::PackTaskStatus::Completed);
        assert!(task.shipping_label.is_some());
        assert_eq!(outbox.events.lock().unwrap()[0].event_type, "packing.completed");
    }

    #[tokio::test]
    async fn unverified_item_blocks_sealing() {
        let task = PackTask::new(
            OrderId::new(),
            vec![PackItem {
                sku: "SKU-1".into(),
                quantity: 1,
                verified: false,
            }],
        );
        let items = vec![LineItem {
            sku: "SKU-1".into(),
            quantity: 1,
            weight: 0.5,
            is_fragile: false,
            is_hazmat: false,
            requires_cold_chain: false,
            unit_price: 10.0,
        }];
        let (_tx, rx) = super::super::signals::channel(1);
        let outbox = RecordingOutbox::default();
        let err = run(task, &StubLabor, &outbox, "A", &items, 30.0, dims(), "ups", rx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::Pack(crate::domain::pack_task::PackTaskError::ItemsNotVerified(_))
        ));
    }
}
