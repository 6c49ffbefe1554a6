//! OutboundManifest repository (spec §3.5, §6.4: stage-specific
//! aggregates own their collection, keyed by `manifestId` with a
//! secondary index on `carrierId`).

use async_trait::async_trait;

use crate::domain::ids::ManifestId;
use crate::domain::shipment::OutboundManifest;

#[derive(Debug, thiserror::Error)]
pub enum ManifestRepositoryError {
    #[error("manifest {0} not found")]
    NotFound(ManifestId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait ManifestRepository: Send + Sync {
    async fn insert(&self, manifest: &OutboundManifest) -> Result<(), ManifestRepositoryError>;
    async fn update(&self, manifest: &OutboundManifest) -> Result<(), ManifestRepositoryError>;
    async fn get(&self, manifest_id: ManifestId) -> Result<OutboundManifest, ManifestRepositoryError>;
    async fn get_by_carrier(&self, carrier_id: &str) -> Result<Vec<OutboundManifest>, ManifestRepositoryError>;
}

/// In-memory repository: used by this module's own tests, and as the
/// storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryManifestRepository {
        manifests: Mutex<HashMap<ManifestId, OutboundManifest>>,
    }

    #[async_trait]
    impl ManifestRepository for InMemoryManifestRepository {
        async fn insert(&self, manifest: &OutboundManifest) -> Result<(), ManifestRepositoryError> {
            self.manifests.lock().unwrap().insert(manifest.manifest_id, manifest.clone());
            Ok(())
        }

        async fn update(&self, manifest: &OutboundManifest) -> Result<(), ManifestRepositoryError> {
            let mut manifests = self.manifests.lock().unwrap();
            if !manifests.contains_key(&manifest.manifest_id) {
                return Err(ManifestRepositoryError::NotFound(manifest.manifest_id));
            }
            manifests.insert(manifest.manifest_id, manifest.clone());
            Ok(())
        }

        async fn get(&self, manifest_id: ManifestId) -> Result<OutboundManifest, ManifestRepositoryError> {
            self.manifests
                .lock()
                .unwrap()
                .get(&manifest_id)
                .cloned()
                .ok_or(ManifestRepositoryError::NotFound(manifest_id))
        }

        async fn get_by_carrier(&self, carrier_id: &str) -> Result<Vec<OutboundManifest>, ManifestRepositoryError> {
            Ok(self
                .manifests
                .lock()
                .unwrap()
                .values()
                .filter(|m| m.carrier_id == carrier_id)
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::in_memory::InMemoryManifestRepository;
    use super::*;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let manifest = OutboundManifest::new("ups".into());

        let repo = InMemoryManifestRepository::default();
        repo.insert(&manifest).await.unwrap();
        let fetched = repo.get(manifest.manifest_id).await.unwrap();
        assert_eq!(fetched.manifest_id, manifest.manifest_id);

        let by_carrier = repo.get_by_carrier("ups").await.unwrap();
        assert_eq!(by_carrier.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_manifest_errors() {
        let repo = InMemoryManifestRepository::default();
        let err = repo.get(ManifestId::new()).await.unwrap_err();
        assert!(matches!(err, ManifestRepositoryError::NotFound(_)));
    }
}
