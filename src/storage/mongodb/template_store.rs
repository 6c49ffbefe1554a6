//! Mongo-backed [`TemplateStore`] (spec §6.4: per-aggregate `status`
//! secondary indexes — here, `path_type`/`active`/`is_default`).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::ids::TemplateId;
use crate::domain::stage_template::StageTemplate;
use crate::execution_plan::template_store::{TemplateStore, TemplateStoreError};

const COLLECTION: &str = "stage_templates";

pub struct MongoTemplateStore {
    templates: Collection<StageTemplate>,
}

impl MongoTemplateStore {
    pub async fn new(database: &Database) -> Result<Self, TemplateStoreError> {
        let templates = database.collection(COLLECTION);
        let store = Self { templates };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> Result<(), TemplateStoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "template_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.templates
            .create_index(index)
            .await
            .map_err(|e| TemplateStoreError::Storage(e.to_string()))?;
        let path_type_index = IndexModel::builder()
            .keys(doc! { "path_type": 1, "active": 1 })
            .build();
        self.templates
            .create_index(path_type_index)
            .await
            .map_err(|e| TemplateStoreError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MongoTemplateStore {
    async fn get(&self, template_id: TemplateId) -> Result<StageTemplate, TemplateStoreError> {
        self.templates
            .find_one(doc! { "template_id": template_id.0.to_string() })
            .await
            .map_err(|e| TemplateStoreError::Storage(e.to_string()))?
            .ok_or(TemplateStoreError::NotFound(template_id))
    }

    async fn list_active(&self, path_type: &str) -> Result<Vec<StageTemplate>, TemplateStoreError> {
        let filter = doc! { "path_type": path_type, "active": true };
        let mut cursor = self
            .templates
            .find(filter)
            .await
            .map_err(|e| TemplateStoreError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| TemplateStoreError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| TemplateStoreError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }

    async fn list_all(&self) -> Result<Vec<StageTemplate>, TemplateStoreError> {
        let mut cursor = self
            .templates
            .find(doc! {})
            .await
            .map_err(|e| TemplateStoreError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| TemplateStoreError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| TemplateStoreError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }

    async fn default_for(&self, path_type: &str) -> Result<Option<StageTemplate>, TemplateStoreError> {
        self.templates
            .find_one(doc! { "path_type": path_type, "is_default": true })
            .await
            .map_err(|e| TemplateStoreError::Storage(e.to_string()))
    }
}
