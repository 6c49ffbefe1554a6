//! TaskRoute — runtime instance of a template for one order (spec §3.4),
//! and its stage state machine (spec §4.4.3).

use serde::{Deserialize, Serialize};

use super::ids::{OrderId, PathId, RouteId, TaskId, TemplateId, WaveId, WorkerId};
use super::process_path::SpecialHandlingTag;
use super::stage_template::{StageDefinition, StageTemplate, StageType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StageStatus::Completed | StageStatus::Failed | StageStatus::Skipped
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteStage {
    pub order: u32,
    pub stage_type: StageType,
    pub task_type: String,
    pub required: bool,
    pub timeout_mins: u32,
    #[serde(default)]
    pub config: serde_json::Value,
    pub status: StageStatus,
    pub task_id: Option<TaskId>,
    pub worker_id: Option<WorkerId>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub error: Option<String>,
}

impl From<&StageDefinition> for RouteStage {
    fn from(def: &StageDefinition) -> Self {
        Self {
            order: def.order,
            stage_type: def.stage_type,
            task_type: def.task_type.clone(),
            required: def.required,
            timeout_mins: def.timeout_mins,
            config: def.config.clone(),
            status: StageStatus::Pending,
            task_id: None,
            worker_id: None,
            started_at: None,
            completed_at: None,
            error: None,
        }
    }
}

/// Illegal stage transitions (spec §4.4.3 "Illegal transitions"). Callers
/// must surface these; they are never retried automatically (spec §7 kind 1,
/// Validation).
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("route {route_id} has no current stage (all stages terminal)")]
    NoCurrentStage { route_id: RouteId },
    #[error(
        "illegal transition on route {route_id} stage {stage_order}: \
         cannot {attempted} while stage is {actual:?}"
    )]
    IllegalTransition {
        route_id: RouteId,
        stage_order: u32,
        attempted: &'static str,
        actual: StageStatus,
    },
    #[error("route {route_id} is already terminal ({status:?})")]
    RouteTerminal { route_id: RouteId, status: RouteStatus },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRoute {
    pub route_id: RouteId,
    pub order_id: OrderId,
    pub wave_id: Option<WaveId>,
    pub path_template_id: TemplateId,
    pub path_type: String,
    pub current_stage_idx: usize,
    pub stages: Vec<RouteStage>,
    pub status: RouteStatus,
    pub special_handling: Vec<SpecialHandlingTag>,
    pub process_path_id: PathId,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TaskRoute {
    /// Instantiate a route from a template (spec §4.4.2): stages cloned in
    /// `pending` status, `current_stage_idx = 0`, overall `pending`.
    pub fn instantiate(
        order_id: OrderId,
        wave_id: Option<WaveId>,
        process_path_id: PathId,
        special_handling: Vec<SpecialHandlingTag>,
        template: &StageTemplate,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        let mut stages: Vec<RouteStage> = template.stages.iter().map(RouteStage::from).collect();
        stages.sort_by_key(|s| s.order);
        Self {
            route_id: RouteId::new(),
            order_id,
            wave_id,
            path_template_id: template.template_id,
            path_type: template.path_type.clone(),
            current_stage_idx: 0,
            stages,
            status: RouteStatus::Pending,
            special_handling,
            process_path_id,
            created_at: now,
            completed_at: None,
        }
    }

    pub fn current_stage(&self) -> Option<&RouteStage> {
        self.stages.get(self.current_stage_idx)
    }

    fn current_stage_mut(&mut self) -> Option<&mut RouteStage> {
        self.stages.get_mut(self.current_stage_idx)
    }

    fn require_not_terminal(&self) -> Result<(), StageTransitionError> {
        if matches!(
            self.status,
            RouteStatus::Completed | RouteStatus::Failed | RouteStatus::Cancelled
        ) {
            return Err(StageTransitionError::RouteTerminal {
                route_id: self.route_id,
                status: self.status,
            });
        }
        Ok(())
    }

    /// `pending -> assigned` via `AssignWorker(workerId, taskId)` (spec §4.4.3 table).
    pub fn assign_worker(
        &mut self,
        worker_id: WorkerId,
        task_id: TaskId,
    ) -> Result<(), StageTransitionError> {
        self.require_not_terminal()?;
        let route_id = self.route_id;
        let stage = self
            .current_stage_mut()
            .ok_or(StageTransitionError::NoCurrentStage { route_id })?;
        if stage.status != StageStatus::Pending {
            return Err(StageTransitionError::IllegalTransition {
                route_id,
                stage_order: stage.order,
                attempted: "AssignWorker",
                actual: stage.status,
            });
        }
        stage.worker_id = Some(worker_id);
        stage.task_id = Some(task_id);
        stage.status = StageStatus::Assigned;
        Ok(())
    }

    /// `assigned -> in_progress` via `StartStage()`. Overall status moves to
    /// `in_progress` on the first stage to start (spec §4.4.3).
    pub fn start_stage(&mut self, now: chrono::DateTime<chrono::Utc>) -> Result<(), StageTransitionError> {
        self.require_not_terminal()?;
        let route_id = self.route_id;
        let stage = self
            .current_stage_mut()
            .ok_or(StageTransitionError::NoCurrentStage { route_id })?;
        if stage.status != StageStatus::Assigned {
            return Err(StageTransitionError::IllegalTransition {
                route_id,
                stage_order: stage.order,
                attempted: "StartStage",
                actual: stage.status,
            });
        }
        stage.status = StageStatus::InProgress;
        stage.started_at = Some(now);
        if self.status == RouteStatus::Pending {
            self.status = RouteStatus::InProgress;
        }
        Ok(())
    }

    /// `in_progress -> completed` via `CompleteStage()`. Advances
    /// `current_stage_idx` past any subsequent skippable-and-skipped stages
    /// (there are none to pre-skip here; skipping only happens via
    /// `fail_stage` on optional stages) to the next non-terminal stage. If no
    /// more stages remain, overall status becomes `completed` (spec §4.4.3,
    /// §3.4 invariant: completed iff every required stage is terminal and at
    /// least one is completed).
    pub fn complete_stage(
        &mut self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StageTransitionError> {
        self.require_not_terminal()?;
        let route_id = self.route_id;
        let stage = self
            .current_stage_mut()
            .ok_or(StageTransitionError::NoCurrentStage { route_id })?;
        if stage.status != StageStatus::InProgress {
            return Err(StageTransitionError::IllegalTransition {
                route_id,
                stage_order: stage.order,
                attempted: "CompleteStage",
                actual: stage.status,
            });
        }
        stage.status = StageStatus::Completed;
        stage.completed_at = Some(now);
        self.advance_past_terminal(now);
        Ok(())
    }

    /// `in_progress -> failed` via `FailStage(err)`. If the stage is
    /// optional (`required = false`) it becomes `skipped` and the route
    /// continues; otherwise the overall route fails (spec §4.4.3).
    pub fn fail_stage(
        &mut self,
        err: String,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), StageTransitionError> {
        self.require_not_terminal()?;
        let route_id = self.route_id;
        let stage = self
            .current_stage_mut()
            .ok_or(StageTransitionError::NoCurrentStage { route_id })?;
        if stage.status != StageStatus::InProgress {
            return Err(StageTransitionError::IllegalTransition {
                route_id,
                stage_order: stage.order,
                attempted: "FailStage",
                actual: stage.status,
            });
        }
        let required = stage.required;
        stage.error = Some(err);
        if required {
            stage.status = StageStatus::Failed;
            self.status = RouteStatus::Failed;
        } else {
            stage.status = StageStatus::Skipped;
            self.advance_past_terminal(now);
        }
        Ok(())
    }

    /// Cancellation is legal from any non-terminal overall status. The
    /// current stage is left as-is (spec §4.4.3: "stage left as-is").
    pub fn cancel(&mut self) -> Result<(), StageTransitionError> {
        self.require_not_terminal()?;
        self.status = RouteStatus::Cancelled;
        Ok(())
    }

    /// After a stage reaches a terminal, non-failing state, move
    /// `current_stage_idx` forward to the lowest-indexed non-terminal stage
    /// (spec §3.4 invariant), and if none remains and at least one stage
    /// completed, mark the route `completed`.
    fn advance_past_terminal(&mut self, now: chrono::DateTime<chrono::Utc>) {
        while self.current_stage_idx < self.stages.len()
            && self.stages[self.current_stage_idx].status.is_terminal()
        {
            self.current_stage_idx += 1;
        }
        if self.current_stage_idx >= self.stages.len() {
            let any_completed = self
                .stages
                .iter()
                .any(|s| s.status == StageStatus::Completed);
            if any_completed {
                self.status = RouteStatus::Completed;
                self.completed_at = Some(now);
            }
        }
    }
}
