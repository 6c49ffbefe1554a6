//! PickTask aggregate (spec §3.5).

use serde::{Deserialize, Serialize};

use super::ids::{AllocationId, OrderId, RouteId, TaskId, WaveId, WorkerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickTaskStatus {
    Pending,
    Assigned,
    InProgress,
    Exception,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickItem {
    pub sku: String,
    pub qty: u32,
    pub location_id: String,
    pub tote_id: Option<String>,
    #[serde(default)]
    pub picked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickTask {
    pub task_id: TaskId,
    pub order_id: OrderId,
    pub wave_id: Option<WaveId>,
    pub route_id: RouteId,
    pub worker_id: Option<WorkerId>,
    pub status: PickTaskStatus,
    pub items: Vec<PickItem>,
    /// Produced on staging (soft -> hard allocation, spec §3.7).
    pub allocation_ids: Vec<AllocationId>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PickTaskError {
    #[error("pick task {0} item {1} already picked")]
    AlreadyPicked(TaskId, String),
    #[error("pick task {0} is in terminal state")]
    Terminal(TaskId),
}

impl PickTask {
    pub fn new(
        order_id: OrderId,
        wave_id: Option<WaveId>,
        route_id: RouteId,
        items: Vec<PickItem>,
    ) -> Self {
        Self {
            task_id: TaskId::new(),
            order_id,
            wave_id,
            route_id,
            worker_id: None,
            status: PickTaskStatus::Pending,
            items,
            allocation_ids: vec![],
        }
    }

    pub fn assign(&mut self, worker_id: WorkerId) {
        self.worker_id = Some(worker_id);
        self.status = PickTaskStatus::Assigned;
    }

    pub fn start(&mut self) {
        self.status = PickTaskStatus::InProgress;
    }

    /// Mark one line item picked (backs the `itemPicked` signal in
    /// [`crate::workflows::picking`]).
    pub fn mark_item_picked(&mut self, sku: &str) -> Result<(), PickTaskError> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.sku == sku && !i.picked)
            .ok_or_else(|| PickTaskError::AlreadyPicked(self.task_id, sku.to_string()))?;
        item.picked = true;
        Ok(())
    }

    pub fn all_items_picked(&self) -> bool {
        self.items.iter().all(|i| i.picked)
    }

    pub fn raise_exception(&mut self) {
        self.status = PickTaskStatus::Exception;
    }

    pub fn complete(&mut self, allocation_ids: Vec<AllocationId>) {
        self.allocation_ids = allocation_ids;
        self.status = PickTaskStatus::Completed;
    }

    pub fn cancel(&mut self) {
        self.status = PickTaskStatus::Cancelled;
    }
}
