//! Mongo-backed [`PickTaskRepository`] (spec §6.4: per-aggregate collection,
//! `taskId`/`routeId` indexes).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::ids::{RouteId, TaskId};
use crate::domain::pick_task::PickTask;
use crate::execution_plan::pick_task_store::{PickTaskRepository, PickTaskRepositoryError};

const COLLECTION: &str = "pick_tasks";

pub struct MongoPickTaskRepository {
    tasks: Collection<PickTask>,
}

impl MongoPickTaskRepository {
    pub async fn new(database: &Database) -> Result<Self, PickTaskRepositoryError> {
        let tasks = database.collection(COLLECTION);
        let repo = Self { tasks };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), PickTaskRepositoryError> {
        let unique_id = IndexModel::builder()
            .keys(doc! { "task_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.tasks
            .create_index(unique_id)
            .await
            .map_err(|e| PickTaskRepositoryError::Storage(e.to_string()))?;
        let by_route = IndexModel::builder().keys(doc! { "route_id": 1 }).build();
        self.tasks
            .create_index(by_route)
            .await
            .map_err(|e| PickTaskRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PickTaskRepository for MongoPickTaskRepository {
    async fn insert(&self, task: &PickTask) -> Result<(), PickTaskRepositoryError> {
        self.tasks
            .insert_one(task)
            .await
            .map_err(|e| PickTaskRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, task: &PickTask) -> Result<(), PickTaskRepositoryError> {
        self.tasks
            .replace_one(doc! { "task_id": task.task_id.0.to_string() }, task)
            .await
            .map_err(|e| PickTaskRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, task_id: TaskId) -> Result<PickTask, PickTaskRepositoryError> {
        self.tasks
            .find_one(doc! { "task_id": task_id.0.to_string() })
            .await
            .map_err(|e| PickTaskRepositoryError::Storage(e.to_string()))?
            .ok_or(PickTaskRepositoryError::NotFound(task_id))
    }

    async fn get_by_route(&self, route_id: RouteId) -> Result<Vec<PickTask>, PickTaskRepositoryError> {
        let mut cursor = self
            .tasks
            .find(doc! { "route_id": route_id.0.to_string() })
            .await
            .map_err(|e| PickTaskRepositoryError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| PickTaskRepositoryError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| PickTaskRepositoryError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }
}
