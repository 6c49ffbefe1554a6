//! ShippingWorkflow (spec §4.5.6, SLAM: Scan-Label-Apply-Manifest).

use std::time::Duration;

use tokio::sync::mpsc;

use crate::clients::inventory::{InventoryClient, ShipRequest};
use crate::config::RetryPolicyConfig;
use crate::domain::ids::AllocationId;
use crate::domain::shipment::{OutboundManifest, Shipment};
use crate::outbox::OutboxStore;

use super::activities::{notify_customer, run_activity};
use super::signals::{await_signal, Awaited};
use super::WorkflowError;

pub const AUTO_CONFIRM_DELAY: Duration = Duration::from_secs(5);

pub enum ShippingSignal {
    ShipConfirmed,
    PackageScanned,
}

/// CreateShipment (the caller passes `shipment` already constructed) →
/// ScanPackage → VerifyShippingLabel → PlaceOnOutboundDock →
/// AddToCarrierManifest → MarkOrderShipped → `ShipInventory` → NotifyCustomer
/// (best-effort). Auto-confirms `AUTO_CONFIRM_DELAY` after manifesting if no
/// `shipConfirmed`/`packageScanned` signal arrives (spec §4.5.6).
pub async fn run(
    mut shipment: Shipment,
    manifest: &mut OutboundManifest,
    inventory: &dyn InventoryClient,
    outbox: &dyn OutboxStore,
    retry: &RetryPolicyConfig,
    allocation_ids: Vec<AllocationId>,
    package_weight: f64,
    carrier: String,
    tracking_number: String,
    signals: mpsc::Receiver<ShippingSignal>,
) -> Result<Shipment, WorkflowError> {
    run_with_delay(
        &mut shipment,
        manifest,
        inventory,
        outbox,
        retry,
        allocation_ids,
        package_weight,
        carrier,
        tracking_number,
        signals,
        AUTO_CONFIRM_DELAY,
    )
    .await?;
    Ok(shipment)
}

#[allow(clippy::too_many_arguments)]
async fn run_with_delay(
    shipment: &mut Shipment,
    manifest: &mut OutboundManifest,
    inventory: &dyn InventoryClient,
    outbox: &dyn OutboxStore,
    retry: &RetryPolicyConfig,
    allocation_ids: Vec<AllocationId>,
    package_weight: f64,
    carrier: String,
    tracking_number: String,
    mut signals: mpsc::Receiver<ShippingSignal>,
    auto_confirm_delay: Duration,
) -> Result<(), WorkflowError> {
    shipment.scan();
    shipment.label(carrier, tracking_number);
    shipment.stage();
    manifest.add_package(shipment.package_id.clone(), package_weight);
    shipment.manifest(manifest.manifest_id);

    // Either an explicit `shipConfirmed`/`packageScanned` signal or the
    // timeout elapsing both lead to the same confirmation step.
    match await_signal(&mut signals, auto_confirm_delay).await {
        Awaited::Signal(_) | Awaited::TimedOut => {}
    }

    let now = chrono::Utc::now();
    shipment.mark_shipped(now);

    run_activity("ShipInventory", retry, || {
        let allocation_ids = allocation_ids.clone();
        async move { inventory.ship(ShipRequest { allocation_ids }).await }
    })
    .await?;

    notify_customer(
        outbox,
        shipment.order_id,
        "wms.shipping.order-shipped",
        serde_json::json!({ "shipmentId": shipment.shipment_id, "shippedAt": now }),
    )
    .await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::inventory::{
        InventoryError, PickRequest, PickResponse, ReleaseReservationRequest, ReturnToShelfRequest, StageRequest,
        StageResponse,
    };
    use crate::domain::ids::OrderId;
    use crate::outbox::OutboxError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubInventory;
    #[async_trait]
    impl InventoryClient for StubInventory {
        async fn confirm_pick(&self, _req: PickRequest) -> Result<PickResponse, InventoryError> {
            Ok(PickResponse { confirmed: true })
        }
        async fn stage(&self, _req: StageRequest) -> Result<StageResponse, InventoryError> {
            Ok(StageResponse { allocation_ids: vec![] })
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

    fn retry() -> RetryPolicyConfig {
        RetryPolicyConfig {
            initial_secs: 0,
            backoff_multiplier: 1.0,
            max_secs: 1,
            max_attempts: 2,
            heartbeat_secs: 30,
        }
    }

    #[tokio::test]
    async fn auto_confirms_and_notifies() {
        let shipment = Shipment::new(OrderId::new(), "PKG-1".into());
        let mut manifest = OutboundManifest::new("UPS".into());
        let outbox = RecordingOutbox::default();
        let (_tx, rx) = super::super::signals::channel(1);

        let shipped = run(
            shipment,
            &mut manifest,
            &StubInventory,
            &outbox,
            &retry(),
            vec![],
            2.0,
            "UPS".into(),
            "TRACK-1".into(),
            rx,
        )
        .await
        .unwrap();

        assert_eq!(shipped.status, crate::domain::shipment::ShipmentStatus::Shipped);
        assert!(shipped.shipped_at.is_some());
        assert_eq!(outbox.events.lock().unwrap().len(), 1);
        assert_eq!(manifest.packages.len(), 1);
    }
}
