//! PickTask repository (spec §3.5, §6.4: stage-specific aggregates own
//! their collection, keyed by `taskId` with a secondary index on `routeId`).

use async_trait::async_trait;

use crate::domain::ids::{RouteId, TaskId};
use crate::domain::pick_task::PickTask;

#[derive(Debug, thiserror::Error)]
pub enum PickTaskRepositoryError {
    #[error("pick task {0} not found")]
    NotFound(TaskId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait PickTaskRepository: Send + Sync {
    async fn insert(&self, task: &PickTask) -> Result<(), PickTaskRepositoryError>;
    async fn update(&self, task: &PickTask) -> Result<(), PickTaskRepositoryError>;
    async fn get(&self, task_id: TaskId) -> Result<PickTask, PickTaskRepositoryError>;
    async fn get_by_route(&self, route_id: RouteId) -> Result<Vec<PickTask>, PickTaskRepositoryError>;
}

/// In-memory repository: used by this module's own tests, and as the
/// storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryPickTaskRepository {
        tasks: Mutex<HashMap<TaskId, PickTask>>,
    }

    #[async_trait]
    impl PickTaskRepository for InMemoryPickTaskRepository {
        async fn insert(&self, task: &PickTask) -> Result<(), PickTaskRepositoryError> {
            self.tasks.lock().unwrap().insert(task.task_id, task.clone());
            Ok(())
        }

        async fn update(&self, task: &PickTask) -> Result<(), PickTaskRepositoryError> {
            let mut tasks = self.tasks.lock().unwrap();
            if !tasks.contains_key(&task.task_id) {
                return Err(PickTaskRepositoryError::NotFound(task.task_id));
            }
            tasks.insert(task.task_id, task.clone());
            Ok(())
        }

        async fn get(&self, task_id: TaskId) -> Result<PickTask, PickTaskRepositoryError> {
            self.tasks
                .lock()
                .unwrap()
                .get(&task_id)
                .cloned()
                .ok_or(PickTaskRepositoryError::NotFound(task_id))
        }

        async fn get_by_route(&self, route_id: RouteId) -> Result<Vec<PickTask>, PickTaskRepositoryError> {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.route_id == route_id)
                .cloned()
                .collect())
        }
    }
}
