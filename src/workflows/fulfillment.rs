//! OrderFulfillmentWorkflow (spec §4.5.1), the top-level per-order workflow.

use tokio::sync::mpsc;

use crate::clients::inventory::InventoryClient;
use crate::clients::labor::LaborClient;
use crate::config::{RetryPolicyConfig, ThresholdConfig};
use crate::domain::consolidation_unit::ConsolidationUnit;
use crate::domain::ids::{TaskId, WaveId};
use crate::domain::inventory::ReservationState;
use crate::domain::order::Order;
use crate::domain::pack_task::{PackItem, PackTask};
use crate::domain::pick_task::{PickItem, PickTask};
use crate::domain::shipment::{OutboundManifest, Shipment};
use crate::domain::stage_template::StageType;
use crate::domain::task_route::{RouteStatus, TaskRoute};
use crate::execution_plan::consolidation_store::ConsolidationRepository;
use crate::execution_plan::manifest_store::ManifestRepository;
use crate::execution_plan::pack_task_store::PackTaskRepository;
use crate::execution_plan::pick_task_store::PickTaskRepository;
use crate::execution_plan::route::RouteRepository;
use crate::execution_plan::shipment_store::ShipmentRepository;
use crate::execution_plan::template_store::TemplateStore;
use crate::execution_plan::worker_assignment::assign_worker;
use crate::execution_plan::{select_template, SelectionContext};
use crate::outbox::OutboxStore;

use super::activities::notify_customer;
use super::{cancellation, consolidation, gift_wrap, packing, picking, shipping, WorkflowError};

/// The signal watched throughout the parent workflow (spec §4.5.1
/// "Cancellation").
pub enum FulfillmentSignal {
    CancelRequested { reason: String },
}

/// Activity-sourced inputs this core doesn't compute itself: pick item
/// locations come from Inventory, package dimensions from a
/// scale/dimensioner activity, and the carrier from routing logic outside
/// this engine's scope (spec doesn't specify either algorithm).
pub struct FulfillmentInputs {
    pub pick_items: Vec<PickItem>,
    pub package_dimensions: crate::domain::pack_task::PackageDimensions,
    pub carrier: String,
}

/// One signal channel per per-stage suspension point (spec §4.5
/// "getSignalChannel.receive"). Each is consumed at most once per route —
/// templates with more than one stage of the same kind aren't modeled.
pub struct StageSignalChannels {
    pub picking: mpsc::Receiver<picking::PickingSignal>,
    pub consolidation: mpsc::Receiver<consolidation::ItemScanned>,
    pub gift_wrap: mpsc::Receiver<gift_wrap::GiftWrapCompleted>,
    pub packing: mpsc::Receiver<packing::ItemVerified>,
    pub shipping: mpsc::Receiver<shipping::ShippingSignal>,
}

#[allow(clippy::too_many_arguments)]
pub async fn run(
    order: Order,
    wave_id: Option<WaveId>,
    templates: &dyn TemplateStore,
    routes: &dyn RouteRepository,
    pick_tasks: &dyn PickTaskRepository,
    pack_tasks: &dyn PackTaskRepository,
    consolidations: &dyn ConsolidationRepository,
    shipments: &dyn ShipmentRepository,
    manifests: &dyn ManifestRepository,
    labor: &dyn LaborClient,
    inventory: &dyn InventoryClient,
    outbox: &dyn OutboxStore,
    thresholds: &ThresholdConfig,
    retry: &RetryPolicyConfig,
    zone: &str,
    inputs: FulfillmentInputs,
    signals: StageSignalChannels,
    mut cancel_signals: mpsc::Receiver<FulfillmentSignal>,
) -> Result<TaskRoute, WorkflowError> {
    let StageSignalChannels {
        picking: picking_signals,
        consolidation: consolidation_signals,
        gift_wrap: gift_wrap_signals,
        packing: packing_signals,
        shipping: shipping_signals,
    } = signals;
    let mut picking_signals = Some(picking_signals);
    let mut consolidation_signals = Some(consolidation_signals);
    let mut gift_wrap_signals = Some(gift_wrap_signals);
    let mut packing_signals = Some(packing_signals);
    let mut shipping_signals = Some(shipping_signals);

    // 1. Resolve plan (C3 + C4).
    let now = chrono::Utc::now();
    let path = crate::process_path::determine(&order, thresholds, now);
    let candidates = templates.list_all().await?;
    let persisted_default = templates.default_for("pick_pack").await?;
    let template = select_template(
        &candidates,
        &path,
        SelectionContext {
            item_count: order.item_count(),
            multi_zone: order.multi_zone,
            order_type: order.order_type.as_deref(),
        },
        persisted_default.as_ref(),
    );

    // 2. Create route.
    let mut route = TaskRoute::instantiate(
        order.order_id,
        wave_id,
        path.path_id,
        path.special_handling.clone(),
        &template,
        now,
    );
    routes.insert(&route).await?;
    notify_customer(
        outbox,
        order.order_id,
        "route.created",
        serde_json::json!({ "routeId": route.route_id, "templateId": route.path_template_id }),
    )
    .await;

    let mut allocation_ids = Vec::new();
    let mut reservation = ReservationState::SoftReserved;
    let mut gift_wrap_details = order.gift_wrap_details.clone();
    let mut pack_task: Option<PackTask> = None;

    // 3. Drive each stage in order.
    loop {
        let stage = match route.current_stage() {
            Some(s) if !matches!(route.status, RouteStatus::Failed | RouteStatus::Cancelled) => s.clone(),
            _ => break,
        };

        let worker_id = assign_worker(labor, &stage.task_type, zone, &[]).await?;
        route.assign_worker(worker_id, TaskId::new())?;
        routes.update(&route).await?;
        route.start_stage(chrono::Utc::now())?;
        routes.update(&route).await?;

        let outcome: Result<(), WorkflowError> = tokio::select! {
            biased;
            Some(FulfillmentSignal::CancelRequested { reason }) = cancel_signals.recv() => {
                return cancellation::run(
                    order.order_id,
                    route,
                    reservation,
                    allocation_ids,
                    inventory,
                    outbox,
                    retry,
                    reason,
                )
                .await;
            }
            res = async {
                match stage.stage_type {
                    StageType::Picking => {
                        let rx = picking_signals
                            .take()
                            .ok_or(WorkflowError::MissingSignalChannel("picking"))?;
                        let task = PickTask::new(order.order_id, wave_id, route.route_id, inputs.pick_items.clone());
                        pick_tasks.insert(&task).await?;
                        let outcome = picking::run(task, labor, inventory, outbox, retry, zone, rx).await?;
                        pick_tasks.update(&outcome.task).await?;
                        allocation_ids = outcome.allocation_ids;
                        reservation = ReservationState::HardAllocated;
                        Ok(())
                    }
                    StageType::Walling | StageType::Consolidation => {
                        let rx = consolidation_signals
                            .take()
                            .ok_or(WorkflowError::MissingSignalChannel("consolidation"))?;
                        let unit = ConsolidationUnit::new(order.order_id, wave_id, order.items.len() as u32);
                        consolidations.insert(&unit).await?;
                        let unit = consolidation::run(unit, labor, outbox, zone, rx).await?;
                        consolidations.update(&unit).await?;
                        Ok(())
                    }
                    StageType::GiftWrap => {
                        let rx = gift_wrap_signals
                            .take()
                            .ok_or(WorkflowError::MissingSignalChannel("gift_wrap"))?;
                        gift_wrap_details = gift_wrap::run(order.order_id, labor, outbox, zone, gift_wrap_details.clone(), rx).await?;
                        Ok(())
                    }
                    StageType::Packing => {
                        let rx = packing_signals
                            .take()
                            .ok_or(WorkflowError::MissingSignalChannel("packing"))?;
                        let pack_items: Vec<PackItem> = order
                            .items
                            .iter()
                            .map(|i| PackItem {
                                sku: i.sku.clone(),
                                quantity: i.quantity,
                                verified: false,
                            })
                            .collect();
                        let task = PackTask::new(order.order_id, pack_items);
                        pack_tasks.insert(&task).await?;
                        let task = packing::run(
                            task,
                            labor,
                            outbox,
                            zone,
                            &order.items,
                            thresholds.oversized_weight_threshold,
                            inputs.package_dimensions.clone(),
                            &inputs.carrier,
                            rx,
                        )
                        .await?;
                        pack_tasks.update(&task).await?;
                        pack_task = Some(task);
                        Ok(())
                    }
                    StageType::Shipping => {
                        let rx = shipping_signals
                            .take()
                            .ok_or(WorkflowError::MissingSignalChannel("shipping"))?;
                        let task = pack_task.as_ref();
                        let tracking_number = task
                            .and_then(|t| t.shipping_label.as_ref())
                            .map(|l| l.tracking_number.clone())
                            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                        let package_weight = task
                            .and_then(|t| t.package.as_ref())
                            .map(|p| p.total_weight)
                            .unwrap_or(0.0);
                        let shipment = Shipment::new(order.order_id, TaskId::new().to_string());
                        let mut manifest = OutboundManifest::new(inputs.carrier.clone());
                        shipments.insert(&shipment).await?;
                        manifests.insert(&manifest).await?;
                        let shipment = shipping::run(
                            shipment,
                            &mut manifest,
                            inventory,
                            outbox,
                            retry,
                            allocation_ids.clone(),
                            package_weight,
                            inputs.carrier.clone(),
                            tracking_number,
                            rx,
                        )
                        .await?;
                        shipments.update(&shipment).await?;
                        manifests.update(&manifest).await?;
                        reservation = ReservationState::Shipped;
                        Ok(())
                    }
                }
            } => res,
        };

        match outcome {
            Ok(()) => {
                route.complete_stage(chrono::Utc::now())?;
            }
            Err(e) => {
                route.fail_stage(e.to_string(), chrono::Utc::now())?;
                if route.status == RouteStatus::Failed {
                    routes.update(&route).await?;
                    return Err(e);
                }
            }
        }
        routes.update(&route).await?;
    }

    notify_customer(
        outbox,
        order.order_id,
        "order.fulfilled",
        serde_json::json!({ "routeId": route.route_id }),
    )
    .await;

    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::inventory::{
        InventoryError, PickRequest, PickResponse, ReleaseReservationRequest, ReturnToShelfRequest, ShipRequest,
        StageRequest, StageResponse,
    };
    use crate::clients::labor::{
        AssignTaskRequest, FindCapableStationsRequest, FindCapableStationsResponse, LaborError, Worker, WorkerQuery,
    };
    use crate::domain::ids::{OrderId, TemplateId, WorkerId};
    use crate::domain::order::LineItem;
    use crate::domain::pack_task::PackageDimensions;
    use crate::domain::stage_template::{SelectionCriteria, StageDefinition, StageTemplate};
    use crate::execution_plan::consolidation_store::in_memory::InMemoryConsolidationRepository;
    use crate::execution_plan::manifest_store::in_memory::InMemoryManifestRepository;
    use crate::execution_plan::pack_task_store::in_memory::InMemoryPackTaskRepository;
    use crate::execution_plan::pick_task_store::in_memory::InMemoryPickTaskRepository;
    use crate::execution_plan::route::in_memory::InMemoryRouteRepository;
    use crate::execution_plan::shipment_store::in_memory::InMemoryShipmentRepository;
    use crate::execution_plan::template_store::in_memory::InMemoryTemplateStore;
    use crate::outbox::{OutboxError, OutboxEvent};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubLabor;
    #[async_trait]
    impl LaborClient for StubLabor {
        async fn find_available(&self, _query: WorkerQuery) -> Result<Worker, LaborError> {
            Ok(Worker {
                worker_id: WorkerId::new(),
                name: "Alice".into(),
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

    struct StubInventory;
    #[async_trait]
    impl InventoryClient for StubInventory {
        async fn confirm_pick(&self, _req: PickRequest) -> Result<PickResponse, InventoryError> {
            Ok(PickResponse { confirmed: true })
        }
        async fn stage(&self, req: StageRequest) -> Result<StageResponse, InventoryError> {
            Ok(StageResponse {
                allocation_ids: req.skus.iter().map(|_| crate::domain::ids::AllocationId::new()).collect(),
            })
        }
        async fn ship(&self, _req: ShipRequest) -> Result<(), InventoryError> {
            Ok(())
        }
        async fn return_to_shelf(&self, _req: ReturnToShelfRequest) -> Result<(), InventoryError> {
            Ok(())
        }
        async fn release_reservation(&self, _req: ReleaseReservationRequest) -> Result<(), InventoryError> {
            Ok(())
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
            max_secs: 1,
            max_attempts: 2,
            heartbeat_secs: 30,
        }
    }

    fn single_item_order() -> Order {
        Order {
            order_id: OrderId::new(),
            items: vec![LineItem {
                sku: "SKU-1".into(),
                quantity: 1,
                weight: 0.5,
                is_fragile: false,
                is_hazmat: false,
                requires_cold_chain: false,
                unit_price: 10.0,
            }],
            gift_wrap: false,
            gift_wrap_details: None,
            total_value: 10.0,
            multi_zone: false,
            order_type: None,
        }
    }

    fn pick_pack_ship_template() -> StageTemplate {
        StageTemplate {
            template_id: TemplateId::new(),
            path_type: "pick_pack".into(),
            stages: vec![
                StageDefinition {
                    order: 0,
                    stage_type: StageType::Picking,
                    task_type: "pick".into(),
                    required: true,
                    timeout_mins: 30,
                    config: serde_json::Value::Null,
                },
                StageDefinition {
                    order: 1,
                    stage_type: StageType::Packing,
                    task_type: "pack".into(),
                    required: true,
                    timeout_mins: 30,
                    config: serde_json::Value::Null,
                },
                StageDefinition {
                    order: 2,
                    stage_type: StageType::Shipping,
                    task_type: "ship".into(),
                    required: true,
                    timeout_mins: 30,
                    config: serde_json::Value::Null,
                },
            ],
            selection_criteria: SelectionCriteria {
                min_items: 0,
                max_items: 10,
                requires_multi_zone: false,
                order_types: vec![],
                priority: 0,
            },
            is_default: true,
            active: true,
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
    async fn happy_path_drives_pick_pack_ship_to_completion() {
        let templates = InMemoryTemplateStore::default();
        templates.seed(pick_pack_ship_template());
        let routes = InMemoryRouteRepository::default();
        let pick_tasks = InMemoryPickTaskRepository::default();
        let pack_tasks = InMemoryPackTaskRepository::default();
        let consolidations = InMemoryConsolidationRepository::default();
        let shipments = InMemoryShipmentRepository::default();
        let manifests = InMemoryManifestRepository::default();
        let outbox = RecordingOutbox::default();

        let (picking_tx, picking_rx) = super::super::signals::channel(4);
        let (_consolidation_tx, consolidation_rx) = super::super::signals::channel(1);
        let (_gift_wrap_tx, gift_wrap_rx) = super::super::signals::channel(1);
        let (packing_tx, packing_rx) = super::super::signals::channel(4);
        let (shipping_tx, shipping_rx) = super::super::signals::channel(1);
        let (_cancel_tx, cancel_rx) = super::super::signals::channel(1);

        picking_tx
            .send(picking::PickingSignal::ItemPicked { sku: "SKU-1".into() })
            .await
            .unwrap();
        picking_tx.send(picking::PickingSignal::PickCompleted).await.unwrap();
        packing_tx.send(packing::ItemVerified { sku: "SKU-1".into() }).await.unwrap();
        shipping_tx.send(shipping::ShippingSignal::ShipConfirmed).await.unwrap();

        let inputs = FulfillmentInputs {
            pick_items: vec![PickItem {
                sku: "SKU-1".into(),
                qty: 1,
                location_id: "A1".into(),
                tote_id: None,
                picked: false,
            }],
            package_dimensions: dims(),
            carrier: "UPS".into(),
        };
        let signals = StageSignalChannels {
            picking: picking_rx,
            consolidation: consolidation_rx,
            gift_wrap: gift_wrap_rx,
            packing: packing_rx,
            shipping: shipping_rx,
        };

        let route = run(
            single_item_order(),
            None,
            &templates,
            &routes,
            &pick_tasks,
            &pack_tasks,
            &consolidations,
            &shipments,
            &manifests,
            &StubLabor,
            &StubInventory,
            &outbox,
            &ThresholdConfig::default(),
            &retry(),
            "A",
            inputs,
            signals,
            cancel_rx,
        )
        .await
        .unwrap();

        assert_eq!(route.status, RouteStatus::Completed);
        assert!(route.stages.iter().all(|s| s.status == crate::domain::task_route::StageStatus::Completed));
        let events = outbox.events.lock().unwrap();
        assert!(events.iter().any(|e| e.event_type == "order.fulfilled"));
    }

    #[tokio::test]
    async fn cancel_signal_short_circuits_the_route() {
        let templates = InMemoryTemplateStore::default();
        templates.seed(pick_pack_ship_template());
        let routes = InMemoryRouteRepository::default();
        let pick_tasks = InMemoryPickTaskRepository::default();
        let pack_tasks = InMemoryPackTaskRepository::default();
        let consolidations = InMemoryConsolidationRepository::default();
        let shipments = InMemoryShipmentRepository::default();
        let manifests = InMemoryManifestRepository::default();
        let outbox = RecordingOutbox::default();

        let (_picking_tx, picking_rx) = super::super::signals::channel(1);
        let (_consolidation_tx, consolidation_rx) = super::super::signals::channel(1);
        let (_gift_wrap_tx, gift_wrap_rx) = super::super::signals::channel(1);
        let (_packing_tx, packing_rx) = super::super::signals::channel(1);
        let (_shipping_tx, shipping_rx) = super::super::signals::channel(1);
        let (cancel_tx, cancel_rx) = super::super::signals::channel(1);

        cancel_tx
            .send(FulfillmentSignal::CancelRequested {
                reason: "customer changed mind".into(),
            })
            .await
            .unwrap();

        let inputs = FulfillmentInputs {
            pick_items: vec![PickItem {
                sku: "SKU-1".into(),
                qty: 1,
                location_id: "A1".into(),
                tote_id: None,
                picked: false,
            }],
            package_dimensions: dims(),
            carrier: "UPS".into(),
        };
        let signals = StageSignalChannels {
            picking: picking_rx,
            consolidation: consolidation_rx,
            gift_wrap: gift_wrap_rx,
            packing: packing_rx,
            shipping: shipping_rx,
        };

        let route = run(
            single_item_order(),
            None,
            &templates,
            &routes,
            &pick_tasks,
            &pack_tasks,
            &consolidations,
            &shipments,
            &manifests,
            &StubLabor,
            &StubInventory,
            &outbox,
            &ThresholdConfig::default(),
            &retry(),
            "A",
            inputs,
            signals,
            cancel_rx,
        )
        .await
        .unwrap();

        assert_eq!(route.status, RouteStatus::Cancelled);
        let events = outbox.events.lock().unwrap();
        assert!(events.iter().any(|e| e.event_type == "wms.orders.cancelled"));
    }
}
