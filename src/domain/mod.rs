//! The data model (spec §3): Order, ProcessPath, StageTemplate, TaskRoute,
//! the per-stage aggregates, Station, and the inventory reservation
//! lifecycle.
//!
//! Ownership follows spec §3's "Ownership" note: `TaskRoute` owns its
//! `Stages` slice exclusively; stage-specific aggregates
//! (`PickTask`/`PackTask`/`Shipment`/...) are independent aggregates
//! referenced by `RouteId` only, never by back-pointer (spec §9
//! "Cyclic aggregate references").

pub mod consolidation_unit;
pub mod ids;
pub mod inventory;
pub mod order;
pub mod pack_task;
pub mod pick_task;
pub mod process_path;
pub mod shipment;
pub mod stage_template;
pub mod station;
pub mod task_route;

pub use consolidation_unit::{ConsolidationStatus, ConsolidationUnit};
pub use ids::*;
pub use inventory::{CancellationAction, ReservationState};
pub use order::{GiftWrapDetails, LineItem, Order};
pub use pack_task::{
    Package, PackageDimensions, PackageType, PackItem, PackTask, PackTaskError, PackTaskStatus,
    ShippingLabel,
};
pub use pick_task::{PickItem, PickTask, PickTaskError, PickTaskStatus};
pub use process_path::{ProcessPath, Requirement, SpecialHandlingTag};
pub use shipment::{ManifestStatus, OutboundManifest, Shipment, ShipmentStatus};
pub use stage_template::{SelectionCriteria, StageDefinition, StageTemplate, StageType};
pub use station::{Station, StationError, StationStatus, StationType};
pub use task_route::{RouteStage, RouteStatus, StageStatus, StageTransitionError, TaskRoute};
