//! PackTask aggregate (spec §3.5) and the packaging-material selection
//! rule from spec §4.5.5 step 2.

use serde::{Deserialize, Serialize};

use super::ids::{OrderId, TaskId, WorkerId};
use super::order::LineItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackTaskStatus {
    Pending,
    InProgress,
    Packed,
    Labeled,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageType {
    Envelope,
    Padded,
    Box,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackItem {
    pub sku: String,
    pub quantity: u32,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDimensions {
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub package_type: PackageType,
    pub dimensions: PackageDimensions,
    pub total_weight: f64,
    pub sealed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingLabel {
    pub tracking_number: String,
    pub carrier: String,
    pub applied_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackTask {
    pub task_id: TaskId,
    pub order_id: OrderId,
    pub packer_id: Option<WorkerId>,
    pub status: PackTaskStatus,
    pub items: Vec<PackItem>,
    pub package: Option<Package>,
    pub shipping_label: Option<ShippingLabel>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PackTaskError {
    #[error("pack task {0}: not all items verified")]
    ItemsNotVerified(TaskId),
    #[error("pack task {0}: no shipping label applied")]
    NoLabel(TaskId),
    #[error("pack task {0}: illegal transition from {from:?}", from = .1)]
    IllegalTransition(TaskId, PackTaskStatus),
}

/// Packaging-material selection (spec §4.5.5 step 2):
/// - envelope for single light non-fragile items
/// - padded for small fragile items
/// - box for fragile items or total weight >= 5 kg
/// - custom for oversized items
/// - padding is added whenever any item is fragile, regardless of the
///   container chosen for it
pub fn select_packaging_material(items: &[LineItem], oversized_threshold_kg: f64) -> PackageType {
    let any_fragile = items.iter().any(|i| i.is_fragile);
    let any_oversized = items.iter().any(|i| i.weight >= oversized_threshold_kg);
    let total_weight: f64 = items.iter().map(|i| i.weight * i.quantity as f64).sum();
    let single_light = items.len() == 1 && items[0].quantity == 1 && total_weight < 1.0;

    if any_oversized {
        PackageType::Custom
    } else if any_fragile && total_weight >= 5.0 {
        PackageType::Box
    } else if any_fragile {
        PackageType::Padded
    } else if single_light {
        PackageType::Envelope
    } else {
        PackageType::Box
    }
}

impl PackTask {
    pub fn new(order_id: OrderId, items: Vec<PackItem>) -> Self {
        Self {
            task_id: TaskId::new(),
            order_id,
            packer_id: None,
            status: PackTaskStatus::Pending,
            items,
            package: None,
            shipping_label: None,
        }
    }

    pub fn assign(&mut self, packer_id: WorkerId) {
        self.packer_id = Some(packer_id);
        self.status = PackTaskStatus::InProgress;
    }

    pub fn verify_item(&mut self, sku: &str) {
        if let Some(item) = self.items.iter_mut().find(|i| i.sku == sku) {
            item.verified = true;
        }
    }

    pub fn all_items_verified(&self) -> bool {
        self.items.iter().all(|i| i.verified)
    }

    pub fn set_package(&mut self, package: Package) -> Result<(), PackTaskError> {
        if self.status != PackTaskStatus::InProgress {
            return Err(PackTaskError::IllegalTransition(self.task_id, self.status));
        }
        self.package = Some(package);
        self.status = PackTaskStatus::Packed;
        Ok(())
    }

    pub fn apply_label(&mut self, label: ShippingLabel) -> Result<(), PackTaskError> {
        if self.status != PackTaskStatus::Packed {
            return Err(PackTaskError::IllegalTransition(self.task_id, self.status));
        }
        self.shipping_label = Some(label);
        self.status = PackTaskStatus::Labeled;
        Ok(())
    }

    /// `SealPackage`: rejected unless all items `verified` (spec P7).
    pub fn seal(&mut self) -> Result<(), PackTaskError> {
        if !self.all_items_verified() {
            return Err(PackTaskError::ItemsNotVerified(self.task_id));
        }
        if let Some(pkg) = self.package.as_mut() {
            pkg.sealed = true;
        }
        Ok(())
    }

    /// Completion requires a label present (spec P7).
    pub fn complete(&mut self) -> Result<(), PackTaskError> {
        if self.shipping_label.is_none() {
            return Err(PackTaskError::NoLabel(self.task_id));
        }
        if self.status != PackTaskStatus::Labeled {
            return Err(PackTaskError::IllegalTransition(self.task_id, self.status));
        }
        self.status = PackTaskStatus::Completed;
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.status = PackTaskStatus::Cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(weight: f64, fragile: bool, hazmat: bool) -> LineItem {
        LineItem {
            sku: "SKU".into(),
            quantity: 1,
            weight,
            is_fragile: fragile,
            is_hazmat: hazmat,
            requires_cold_chain: false,
            unit_price: 1.0,
        }
    }

    #[test]
    fn single_light_item_gets_envelope() {
        let items = vec![item(0.15, false, false)];
        assert_eq!(select_packaging_material(&items, 30.0), PackageType::Envelope);
    }

    #[test]
    fn fragile_light_item_gets_padded() {
        let items = vec![item(0.5, true, false)];
        assert_eq!(select_packaging_material(&items, 30.0), PackageType::Padded);
    }

    #[test]
    fn fragile_heavy_item_gets_box() {
        let items = vec![item(22.0, true, false)];
        assert_eq!(select_packaging_material(&items, 30.0), PackageType::Box);
    }

    #[test]
    fn oversized_item_gets_custom() {
        let items = vec![item(31.0, false, false)];
        assert_eq!(select_packaging_material(&items, 30.0), PackageType::Custom);
    }

    #[test]
    fn seal_rejected_unless_all_verified() {
        let mut task = PackTask::new(
            OrderId::new(),
            vec![PackItem {
                sku: "A".into(),
                quantity: 1,
                verified: false,
            }],
        );
        assert_eq!(task.seal(), Err(PackTaskError::ItemsNotVerified(task.task_id)));
        task.verify_item("A");
        assert!(task.seal().is_ok());
    }

    #[test]
    fn complete_rejected_without_label() {
        let mut task = PackTask::new(OrderId::new(), vec![]);
        task.assign(WorkerId::new());
        task.set_package(Package {
            package_type: PackageType::Box,
            dimensions: PackageDimensions {
                length_cm: 1.0,
                width_cm: 1.0,
                height_cm: 1.0,
            },
            total_weight: 1.0,
            sealed: false,
        })
        .unwrap();
        assert_eq!(task.complete(), Err(PackTaskError::NoLabel(task.task_id)));
    }
}
