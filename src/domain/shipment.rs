//! Shipment and OutboundManifest aggregates (spec §3.5) — the SLAM
//! subprocedure (Scan, Label, Apply, Manifest) in
//! [`crate::workflows::shipping`].

use serde::{Deserialize, Serialize};

use super::ids::{ManifestId, OrderId, ShipmentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    Pending,
    Scanned,
    Labeled,
    Staged,
    Manifested,
    Shipped,
    InTransit,
    Delivered,
    Exception,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub shipment_id: ShipmentId,
    pub order_id: OrderId,
    pub package_id: String,
    pub status: ShipmentStatus,
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    pub manifest_id: Option<ManifestId>,
    pub shipped_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Shipment {
    pub fn new(order_id: OrderId, package_id: String) -> Self {
        Self {
            shipment_id: ShipmentId::new(),
            order_id,
            package_id,
            status: ShipmentStatus::Pending,
            carrier: None,
            tracking_number: None,
            manifest_id: None,
            shipped_at: None,
        }
    }

    pub fn scan(&mut self) {
        self.status = ShipmentStatus::Scanned;
    }

    pub fn label(&mut self, carrier: String, tracking_number: String) {
        self.carrier = Some(carrier);
        self.tracking_number = Some(tracking_number);
        self.status = ShipmentStatus::Labeled;
    }

    pub fn stage(&mut self) {
        self.status = ShipmentStatus::Staged;
    }

    pub fn manifest(&mut self, manifest_id: ManifestId) {
        self.manifest_id = Some(manifest_id);
        self.status = ShipmentStatus::Manifested;
    }

    pub fn mark_shipped(&mut self, shipped_at: chrono::DateTime<chrono::Utc>) {
        self.status = ShipmentStatus::Shipped;
        self.shipped_at = Some(shipped_at);
    }

    pub fn cancellable(&self) -> bool {
        !matches!(
            self.status,
            ShipmentStatus::Shipped | ShipmentStatus::InTransit | ShipmentStatus::Delivered
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestStatus {
    Open,
    Closed,
    Dispatching,
    Dispatched,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundManifest {
    pub manifest_id: ManifestId,
    pub carrier_id: String,
    pub status: ManifestStatus,
    pub packages: Vec<String>,
    pub trailer_id: Option<String>,
    pub dispatch_dock: Option<String>,
    pub scheduled_pickup: Option<chrono::DateTime<chrono::Utc>>,
    pub total_weight: f64,
}

impl OutboundManifest {
    pub fn new(carrier_id: String) -> Self {
        Self {
            manifest_id: ManifestId::new(),
            carrier_id,
            status: ManifestStatus::Open,
            packages: vec![],
            trailer_id: None,
            dispatch_dock: None,
            scheduled_pickup: None,
            total_weight: 0.0,
        }
    }

    pub fn add_package(&mut self, package_id: String, weight: f64) {
        self.packages.push(package_id);
        self.total_weight += weight;
    }

    pub fn close(&mut self) {
        self.status = ManifestStatus::Closed;
    }

    pub fn dispatch(&mut self) {
        self.status = ManifestStatus::Dispatched;
    }
}
