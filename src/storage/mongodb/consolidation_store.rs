//! Mongo-backed [`ConsolidationRepository`] (spec §6.4: per-aggregate
//! collection, `consolidationId`/`orderId` indexes).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::consolidation_unit::ConsolidationUnit;
use crate::domain::ids::{ConsolidationId, OrderId};
use crate::execution_plan::consolidation_store::{ConsolidationRepository, ConsolidationRepositoryError};

const COLLECTION: &str = "consolidation_units";

pub struct MongoConsolidationRepository {
    units: Collection<ConsolidationUnit>,
}

impl MongoConsolidationRepository {
    pub async fn new(database: &Database) -> Result<Self, ConsolidationRepositoryError> {
        let units = database.collection(COLLECTION);
        let repo = Self { units };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), ConsolidationRepositoryError> {
        let unique_id = IndexModel::builder()
            .keys(doc! { "consolidation_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.units
            .create_index(unique_id)
            .await
            .map_err(|e| ConsolidationRepositoryError::Storage(e.to_string()))?;
        let by_order = IndexModel::builder().keys(doc! { "order_id": 1 }).build();
        self.units
            .create_index(by_order)
            .await
            .map_err(|e| ConsolidationRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ConsolidationRepository for MongoConsolidationRepository {
    async fn insert(&self, unit: &ConsolidationUnit) -> Result<(), ConsolidationRepositoryError> {
        self.units
            .insert_one(unit)
            .await
            .map_err(|e| ConsolidationRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, unit: &ConsolidationUnit) -> Result<(), ConsolidationRepositoryError> {
        self.units
            .replace_one(doc! { "consolidation_id": unit.consolidation_id.0.to_string() }, unit)
            .await
            .map_err(|e| ConsolidationRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, consolidation_id: ConsolidationId) -> Result<ConsolidationUnit, ConsolidationRepositoryError> {
        self.units
            .find_one(doc! { "consolidation_id": consolidation_id.0.to_string() })
            .await
            .map_err(|e| ConsolidationRepositoryError::Storage(e.to_string()))?
            .ok_or(ConsolidationRepositoryError::NotFound(consolidation_id))
    }

    async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<ConsolidationUnit>, ConsolidationRepositoryError> {
        let mut cursor = self
            .units
            .find(doc! { "order_id": order_id.0.to_string() })
            .await
            .map_err(|e| ConsolidationRepositoryError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| ConsolidationRepositoryError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| ConsolidationRepositoryError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }
}
