//! PackTask repository (spec §3.5, §6.4: stage-specific aggregates own
//! their collection, keyed by `taskId` with a secondary index on `orderId`).

use async_trait::async_trait;

use crate::domain::ids::{OrderId, TaskId};
use crate::domain::pack_task::PackTask;

#[derive(Debug, thiserror::Error)]
pub enum PackTaskRepositoryError {
    #[error("pack task {0} not found")]
    NotFound(TaskId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait PackTaskRepository: Send + Sync {
    async fn insert(&self, task: &PackTask) -> Result<(), PackTaskRepositoryError>;
    async fn update(&self, task: &PackTask) -> Result<(), PackTaskRepositoryError>;
    async fn get(&self, task_id: TaskId) -> Result<PackTask, PackTaskRepositoryError>;
    async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<PackTask>, PackTaskRepositoryError>;
}

/// In-memory repository: used by this module's own tests, and as the
/// storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryPackTaskRepository {
        tasks: Mutex<HashMap<TaskId, PackTask>>,
    }

    #[async_trait]
    impl PackTaskRepository for InMemoryPackTaskRepository {
        async fn insert(&self, task: &PackTask) -> Result<(), PackTaskRepositoryError> {
            self.tasks.lock().unwrap().insert(task.task_id, task.clone());
            Ok(())
        }

        async fn update(&self, task: &PackTask) -> Result<(), PackTaskRepositoryError> {
            let mut tasks = self.tasks.lock().unwrap();
            if !tasks.contains_key(&task.task_id) {
                return Err(PackTaskRepositoryError::NotFound(task.task_id));
            }
            tasks.insert(task.task_id, task.clone());
            Ok(())
        }

        async fn get(&self, task_id: TaskId) -> Result<PackTask, PackTaskRepositoryError> {
            self.tasks
                .lock()
                .unwrap()
                .get(&task_id)
                .cloned()
                .ok_or(PackTaskRepositoryError::NotFound(task_id))
        }

        async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<PackTask>, PackTaskRepositoryError> {
            Ok(self
                .tasks
                .lock()
                .unwrap()
                .values()
                .filter(|t| t.order_id == order_id)
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::in_memory::InMemoryPackTaskRepository;
    use super::*;
    use crate::domain::pack_task::PackItem;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let order_id = OrderId::new();
        let task = PackTask::new(
            order_id,
            vec![PackItem {
                sku: "SKU-1".into(),
                quantity: 1,
                verified: false,
            }],
        );

        let repo = InMemoryPackTaskRepository::default();
        repo.insert(&task).await.unwrap();
        let fetched = repo.get(task.task_id).await.unwrap();
        assert_eq!(fetched.task_id, task.task_id);

        let by_order = repo.get_by_order(order_id).await.unwrap();
        assert_eq!(by_order.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_task_errors() {
        let repo = InMemoryPackTaskRepository::default();
        let err = repo.get(TaskId::new()).await.unwrap_err();
        assert!(matches!(err, PackTaskRepositoryError::NotFound(_)));
    }
}
