//! OrderCancellationWorkflow (spec §4.5.7).

use crate::clients::inventory::{InventoryClient, ReleaseReservationRequest, ReturnToShelfRequest};
use crate::config::RetryPolicyConfig;
use crate::domain::ids::{AllocationId, OrderId};
use crate::domain::inventory::{CancellationAction, ReservationState};
use crate::domain::task_route::TaskRoute;
use crate::outbox::OutboxStore;

use super::activities::{notify_customer, run_activity};
use super::WorkflowError;

/// Cancel `route`, dispatching the inventory compensating action per
/// `reservation` via [`ReservationState::cancellation_action`] (spec
/// §4.5.7/§3.7). Inventory and notification failures are logged as
/// warnings; the route's `cancelled` status is authoritative regardless
/// (spec: "the order's cancelled status is authoritative"). A shipped
/// reservation refuses cancellation outright.
pub async fn run(
    order_id: OrderId,
    mut route: TaskRoute,
    reservation: ReservationState,
    allocation_ids: Vec<AllocationId>,
    inventory: &dyn InventoryClient,
    outbox: &dyn OutboxStore,
    retry: &RetryPolicyConfig,
    reason: String,
) -> Result<TaskRoute, WorkflowError> {
    match reservation.cancellation_action() {
        CancellationAction::Refuse => return Err(WorkflowError::AlreadyShipped),
        CancellationAction::Release => {
            route.cancel()?;
            if let Err(e) = run_activity("ReleaseInventoryReservation", retry, || async {
                inventory
                    .release_reservation(ReleaseReservationRequest { allocation_ids: allocation_ids.clone() })
                    .await
            })
            .await
            {
                tracing::warn!(error = %e, %order_id, "release reservation failed, cancellation proceeds");
            }
        }
        CancellationAction::ReturnToShelf => {
            route.cancel()?;
            if let Err(e) = run_activity("ReturnInventoryToShelf", retry, || {
                let allocation_ids = allocation_ids.clone();
                async move { inventory.return_to_shelf(ReturnToShelfRequest { allocation_ids }).await }
            })
            .await
            {
                tracing::warn!(error = %e, %order_id, "return to shelf failed, cancellation proceeds");
            }
        }
    }

    notify_customer(
        outbox,
        order_id,
        "wms.orders.cancelled",
        serde_json::json!({ "reason": reason }),
    )
    .await;

    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::inventory::{InventoryError, PickRequest, PickResponse, ShipRequest, StageRequest, StageResponse};
    use crate::domain::ids::{PathId, TemplateId};
    use crate::domain::stage_template::{SelectionCriteria, StageDefinition, StageTemplate, StageType};
    use crate::outbox::{OutboxError, OutboxEvent};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FailingInventory;
    #[async_trait]
    impl InventoryClient for FailingInventory {
        async fn confirm_pick(&self, _req: PickRequest) -> Result<PickResponse, InventoryError> {
            unreachable!()
        }
        async fn stage(&self, _req: StageRequest) -> Result<StageResponse, InventoryError> {
            unreachable!()
        }
        async fn ship(&self, _req: ShipRequest) -> Result<(), InventoryError> {
            unreachable!()
        }
        async fn return_to_shelf(&self, _req: ReturnToShelfRequest) -> Result<(), InventoryError> {
            Err(InventoryError::Response {
                status: 503,
                body: "down".into(),
            })
        }
        async fn release_reservation(&self, _req: ReleaseReservationRequest) -> Result<(), InventoryError> {
            Err(InventoryError::Response {
                status: 503,
                body: "down".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingOutbox {
        events: Mutex<Vec<OutboxEvent>>,
    }
    #[async_trait]
    impl OutboxStore for RecordingOutbox {
        async fn append(&self, event: OutboxEvent) -> Result<(), OutboxError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
        async fn fetch_unpublished(&self, _batch_size: usize) -> Result<Vec<OutboxEvent>, OutboxError> {
            Ok(vec![])
        }
        async fn mark_published(&self, _id: uuid::Uuid) -> Result<(), OutboxError> {
            Ok(())
        }
        async fn record_failure(&self, _id: uuid::Uuid, _error: String, _next_retry_at: chrono::DateTime<chrono::Utc>) -> Result<(), OutboxError> {
            Ok(())
        }
    }

    fn retry() -> RetryPolicyConfig {
        RetryPolicyConfig {
            initial_secs: 0,
            backoff_multiplier: 1.0,
            max_secs: 0,
            max_attempts: 1,
            heartbeat_secs: 30,
        }
    }

    fn route() -> TaskRoute {
        let template = StageTemplate {
            template_id: TemplateId::new(),
            path_type: "pick_pack".into(),
            stages: vec![StageDefinition {
                order: 0,
                stage_type: StageType::Picking,
                task_type: "pick".into(),
                required: true,
                timeout_mins: 30,
                config: serde_json::Value::Null,
            }],
            selection_criteria: SelectionCriteria {
                min_items: 0,
                max_items: 10,
                requires_multi_zone: false,
                order_types: vec![],
                priority: 0,
            },
            is_default: true,
            active: true,
        };
        TaskRoute::instantiate(OrderId::new(), None, PathId::new(), vec![], &template, chrono::Utc::now())
    }

    #[tokio::test]
    async fn inventory_failure_does_not_block_cancellation() {
        let outbox = RecordingOutbox::default();
        let cancelled = run(
            OrderId::new(),
            route(),
            ReservationState::HardAllocated,
            vec![],
            &FailingInventory,
            &outbox,
            &retry(),
            "customer request".into(),
        )
        .await
        .unwrap();

        assert_eq!(cancelled.status, crate::domain::task_route::RouteStatus::Cancelled);
        assert_eq!(outbox.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn shipped_order_refuses_cancellation() {
        let outbox = RecordingOutbox::default();
        let err = run(
            OrderId::new(),
            route(),
            ReservationState::Shipped,
            vec![],
            &FailingInventory,
            &outbox,
            &retry(),
            "customer request".into(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyShipped));
    }
}
