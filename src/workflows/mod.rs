//! C5: Workflow Orchestrator (spec §4.5).
//!
//! A workflow here is a plain async function: suspension points named in the
//! spec (`executeActivity`, `newTimer`, `signalChannel.receive`, `select`)
//! map onto `.await` points over [`activities::run_activity`],
//! `tokio::time::sleep`, and [`signals::await_signal`]. There is no custom
//! durable-execution runtime — history is whatever the caller's
//! [`crate::execution_plan::route::RouteRepository`] persists after each
//! stage transition, which is enough to resume a route at its current stage
//! after a process restart (spec §4.5 "the runtime persists history after
//! every completed turn").
//!
//! [`fulfillment`] is the top-level workflow; the rest are its per-stage
//! children.

pub mod activities;
pub mod cancellation;
pub mod consolidation;
pub mod fulfillment;
pub mod gift_wrap;
pub mod packing;
pub mod picking;
pub mod shipping;
pub mod signals;

use thiserror::Error;

use crate::clients::inventory::InventoryError;
use crate::clients::labor::LaborError;
use crate::domain::pack_task::PackTaskError;
use crate::domain::task_route::StageTransitionError;
use crate::execution_plan::consolidation_store::ConsolidationRepositoryError;
use crate::execution_plan::manifest_store::ManifestRepositoryError;
use crate::execution_plan::pack_task_store::PackTaskRepositoryError;
use crate::execution_plan::pick_task_store::PickTaskRepositoryError;
use crate::execution_plan::route::RouteRepositoryError;
use crate::execution_plan::shipment_store::ShipmentRepositoryError;
use crate::execution_plan::station_store::StationRepositoryError;
use crate::execution_plan::template_store::TemplateStoreError;
use crate::execution_plan::worker_assignment::AssignmentError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Route(#[from] StageTransitionError),
    #[error(transparent)]
    RouteRepository(#[from] RouteRepositoryError),
    #[error(transparent)]
    Template(#[from] TemplateStoreError),
    #[error(transparent)]
    Station(#[from] StationRepositoryError),
    #[error(transparent)]
    Assignment(#[from] AssignmentError),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
    #[error(transparent)]
    Labor(#[from] LaborError),
    #[error(transparent)]
    Pack(#[from] PackTaskError),
    #[error(transparent)]
    PickTaskRepository(#[from] PickTaskRepositoryError),
    #[error(transparent)]
    PackTaskRepository(#[from] PackTaskRepositoryError),
    #[error(transparent)]
    ConsolidationRepository(#[from] ConsolidationRepositoryError),
    #[error(transparent)]
    ShipmentRepository(#[from] ShipmentRepositoryError),
    #[error(transparent)]
    ManifestRepository(#[from] ManifestRepositoryError),
    /// A signal-wait suspension point elapsed its timeout (spec §4.5.2/3/4:
    /// `pickCompleted`, `shortTimeout`, `giftWrapCompleted`).
    #[error("{0} timed out waiting for {1}")]
    TimedOut(&'static str, &'static str),
    /// Cancellation requested on an already-shipped order (spec §4.5.7:
    /// "refuse; instruct returns process").
    #[error("order already shipped, use the returns process instead")]
    AlreadyShipped,
    /// A stage's signal channel was already consumed by an earlier stage of
    /// the same kind on this route (spec's tagged-enum dispatch assumes one
    /// stage per kind; a template violating that has no channel to offer).
    #[error("no {0} signal channel available for this stage")]
    MissingSignalChannel(&'static str),
}
