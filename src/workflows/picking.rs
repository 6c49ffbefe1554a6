//! PickingWorkflow (spec §4.5.2).

use std::time::Duration;

use tokio::sync::mpsc;

use crate::clients::inventory::{InventoryClient, PickRequest, StageRequest};
use crate::clients::labor::{AssignTaskRequest, LaborClient};
use crate::config::RetryPolicyConfig;
use crate::domain::ids::AllocationId;
use crate::domain::pick_task::PickTask;
use crate::execution_plan::worker_assignment::assign_worker;
use crate::outbox::OutboxStore;

use super::activities::{notify_customer, run_activity};
use super::signals::{await_signal, Awaited};
use super::WorkflowError;

pub const PICK_COMPLETED_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Granular progress signals plus the terminal `pickCompleted` (spec
/// §4.5.2: "accept granular signals ... for progress").
pub enum PickingSignal {
    ItemPicked { sku: String },
    PickException,
    PickCompleted,
}

pub struct PickingOutcome {
    pub task: PickTask,
    pub allocation_ids: Vec<AllocationId>,
}

/// Create pick task → assign worker → wait on `pickCompleted` (30 min
/// timeout, accepting `itemPicked`/`pickException` along the way) → confirm
/// pick and stage inventory (spec §4.5.2).
#[allow(clippy::too_many_arguments)]
pub async fn run(
    task: PickTask,
    labor: &dyn LaborClient,
    inventory: &dyn InventoryClient,
    outbox: &dyn OutboxStore,
    retry: &RetryPolicyConfig,
    zone: &str,
    signals: mpsc::Receiver<PickingSignal>,
) -> Result<PickingOutcome, WorkflowError> {
    run_with_timeout(task, labor, inventory, outbox, retry, zone, signals, PICK_COMPLETED_TIMEOUT).await
}

#[allow(clippy::too_many_arguments)]
async fn run_with_timeout(
    mut task: PickTask,
    labor: &dyn LaborClient,
    inventory: &dyn InventoryClient,
    outbox: &dyn OutboxStore,
    retry: &RetryPolicyConfig,
    zone: &str,
    mut signals: mpsc::Receiver<PickingSignal>,
    pick_completed_timeout: Duration,
) -> Result<PickingOutcome, WorkflowError> {
    let worker_id = assign_worker(labor, "pick", zone, &[]).await?;
    task.assign(worker_id);
    labor
        .assign_task(
            worker_id,
            AssignTaskRequest {
                task_id: task.task_id.0.to_string(),
            },
        )
        .await?;
    task.start();

    loop {
        match await_signal(&mut signals, pick_completed_timeout).await {
            Awaited::TimedOut => return Err(WorkflowError::TimedOut("PickingWorkflow", "pickCompleted")),
            Awaited::Signal(PickingSignal::ItemPicked { sku }) => {
                let _ = task.mark_item_picked(&sku);
            }
            Awaited::Signal(PickingSignal::PickException) => task.raise_exception(),
            Awaited::Signal(PickingSignal::PickCompleted) => break,
        }
    }

    for item in task.items.clone() {
        run_activity("ConfirmInventoryPick", retry, || {
            let item = item.clone();
            async move {
                inventory
                    .confirm_pick(PickRequest {
                        sku: item.sku,
                        quantity: item.qty,
                        location_id: item.location_id,
                    })
                    .await
            }
        })
        .await?;
    }

    let skus: Vec<String> = task.items.iter().map(|i| i.sku.clone()).collect();
    let order_id = task.order_id.0.to_string();
    let staged = run_activity("StageInventory", retry, || {
        let skus = skus.clone();
        let order_id = order_id.clone();
        async move { inventory.stage(StageRequest { order_id, skus }).await }
    })
    .await?;

    task.complete(staged.allocation_ids.clone());

    notify_customer(
        outbox,
        task.order_id,
        "picking.completed",
        serde_json::json!({ "allocationIds": staged.allocation_ids }),
    )
    .await;

    Ok(PickingOutcome {
        allocation_ids: staged.allocation_ids,
        task,
    })
}
