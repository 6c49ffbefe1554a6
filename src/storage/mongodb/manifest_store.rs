//! Mongo-backed [`ManifestRepository`] (spec §6.4: per-aggregate
//! collection, `manifestId`/`carrierId` indexes).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::ids::ManifestId;
use crate::domain::shipment::OutboundManifest;
use crate::execution_plan::manifest_store::{ManifestRepository, ManifestRepositoryError};

const COLLECTION: &str = "outbound_manifests";

pub struct MongoManifestRepository {
    manifests: Collection<OutboundManifest>,
}

impl MongoManifestRepository {
    pub async fn new(database: &Database) -> Result<Self, ManifestRepositoryError> {
        let manifests = database.collection(COLLECTION);
        let repo = Self { manifests };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), ManifestRepositoryError> {
        let unique_id = IndexModel::builder()
            .keys(doc! { "manifest_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.manifests
            .create_index(unique_id)
            .await
            .map_err(|e| ManifestRepositoryError::Storage(e.to_string()))?;
        let by_carrier = IndexModel::builder().keys(doc! { "carrier_id": 1 }).build();
        self.manifests
            .create_index(by_carrier)
            .await
            .map_err(|e| ManifestRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ManifestRepository for MongoManifestRepository {
    async fn insert(&self, manifest: &OutboundManifest) -> Result<(), ManifestRepositoryError> {
        self.manifests
            .insert_one(manifest)
            .await
            .map_err(|e| ManifestRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, manifest: &OutboundManifest) -> Result<(), ManifestRepositoryError> {
        self.manifests
            .replace_one(doc! { "manifest_id": manifest.manifest_id.0.to_string() }, manifest)
            .await
            .map_err(|e| ManifestRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, manifest_id: ManifestId) -> Result<OutboundManifest, ManifestRepositoryError> {
        self.manifests
            .find_one(doc! { "manifest_id": manifest_id.0.to_string() })
            .await
            .map_err(|e| ManifestRepositoryError::Storage(e.to_string()))?
            .ok_or(ManifestRepositoryError::NotFound(manifest_id))
    }

    async fn get_by_carrier(&self, carrier_id: &str) -> Result<Vec<OutboundManifest>, ManifestRepositoryError> {
        let mut cursor = self
            .manifests
            .find(doc! { "carrier_id": carrier_id })
            .await
            .map_err(|e| ManifestRepositoryError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| ManifestRepositoryError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| ManifestRepositoryError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }
}
