//! Mongo-backed [`ProcessPathRepository`] (spec §6.4: per-aggregate `orderId` index).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::ids::OrderId;
use crate::domain::process_path::ProcessPath;
use crate::process_path::store::{ProcessPathRepository, ProcessPathRepositoryError};

const COLLECTION: &str = "process_paths";

pub struct MongoProcessPathRepository {
    paths: Collection<ProcessPath>,
}

impl MongoProcessPathRepository {
    pub async fn new(database: &Database) -> Result<Self, ProcessPathRepositoryError> {
        let paths = database.collection(COLLECTION);
        let repo = Self { paths };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), ProcessPathRepositoryError> {
        let by_order = IndexModel::builder()
            .keys(doc! { "order_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.paths
            .create_index(by_order)
            .await
            .map_err(|e| ProcessPathRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ProcessPathRepository for MongoProcessPathRepository {
    async fn insert(&self, path: &ProcessPath) -> Result<(), ProcessPathRepositoryError> {
        self.paths
            .replace_one(doc! { "order_id": path.order_id.0.to_string() }, path)
            .with_options(
                mongodb::options::ReplaceOptions::builder()
                    .upsert(true)
                    .build(),
            )
            .await
            .map_err(|e| ProcessPathRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get_by_order(&self, order_id: OrderId) -> Result<ProcessPath, ProcessPathRepositoryError> {
        self.paths
            .find_one(doc! { "order_id": order_id.0.to_string() })
            .await
            .map_err(|e| ProcessPathRepositoryError::Storage(e.to_string()))?
            .ok_or(ProcessPathRepositoryError::NotFound(order_id))
    }
}
