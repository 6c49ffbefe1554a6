//! Mongo-backed [`PackTaskRepository`] (spec §6.4: per-aggregate collection,
//! `taskId`/`orderId` indexes).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::ids::{OrderId, TaskId};
use crate::domain::pack_task::PackTask;
use crate::execution_plan::pack_task_store::{PackTaskRepository, PackTaskRepositoryError};

const COLLECTION: &str = "pack_tasks";

pub struct MongoPackTaskRepository {
    tasks: Collection<PackTask>,
}

impl MongoPackTaskRepository {
    pub async fn new(database: &Database) -> Result<Self, PackTaskRepositoryError> {
        let tasks = database.collection(COLLECTION);
        let repo = Self { tasks };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), PackTaskRepositoryError> {
        let unique_id = IndexModel::builder()
            .keys(doc! { "task_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.tasks
            .create_index(unique_id)
            .await
            .map_err(|e| PackTaskRepositoryError::Storage(e.to_string()))?;
        let by_order = IndexModel::builder().keys(doc! { "order_id": 1 }).build();
        self.tasks
            .create_index(by_order)
            .await
            .map_err(|e| PackTaskRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl PackTaskRepository for MongoPackTaskRepository {
    async fn insert(&self, task: &PackTask) -> Result<(), PackTaskRepositoryError> {
        self.tasks
            .insert_one(task)
            .await
            .map_err(|e| PackTaskRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, task: &PackTask) -> Result<(), PackTaskRepositoryError> {
        self.tasks
            .replace_one(doc! { "task_id": task.task_id.0.to_string() }, task)
            .await
            .map_err(|e| PackTaskRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, task_id: TaskId) -> Result<PackTask, PackTaskRepositoryError> {
        self.tasks
            .find_one(doc! { "task_id": task_id.0.to_string() })
            .await
            .map_err(|e| PackTaskRepositoryError::Storage(e.to_string()))?
            .ok_or(PackTaskRepositoryError::NotFound(task_id))
    }

    async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<PackTask>, PackTaskRepositoryError> {
        let mut cursor = self
            .tasks
            .find(doc! { "order_id": order_id.0.to_string() })
            .await
            .map_err(|e| PackTaskRepositoryError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| PackTaskRepositoryError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| PackTaskRepositoryError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }
}
