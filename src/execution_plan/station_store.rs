//! Station repository (spec §5 "Shared resources"): capacity updates race
//! across concurrent worker-assignment calls, so implementations must apply
//! `increment_tasks`/`decrement_tasks` as a compare-and-swap on `version`.

use async_trait::async_trait;

use crate::domain::ids::StationId;
use crate::domain::station::{Station, StationType};

#[derive(Debug, thiserror::Error)]
pub enum StationRepositoryError {
    #[error("station {0} not found")]
    NotFound(StationId),
    /// The station moved between read and write (its `version` no longer
    /// matches); callers should re-fetch and retry the admission check.
    #[error("station {0} was concurrently modified, retry")]
    Conflict(StationId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait StationRepository: Send + Sync {
    async fn get(&self, station_id: StationId) -> Result<Station, StationRepositoryError>;

    async fn find_capable(
        &self,
        station_type: StationType,
        zone: &str,
    ) -> Result<Vec<Station>, StationRepositoryError>;

    /// Persist `station`, using its `version` field as the CAS predicate
    /// against the stored copy. Fails with [`StationRepositoryError::Conflict`]
    /// if the stored version has moved on.
    async fn compare_and_swap(&self, station: &Station, expected_version: u64) -> Result<(), StationRepositoryError>;
}

/// In-memory station repository: used by this module's own tests, and as
/// the storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryStationRepository {
        stations: Mutex<HashMap<StationId, Station>>,
    }

    impl InMemoryStationRepository {
        pub fn seed(&self, station: Station) {
            self.stations.lock().unwrap().insert(station.station_id, station);
        }
    }

    #[async_trait]
    impl StationRepository for InMemoryStationRepository {
        async fn get(&self, station_id: StationId) -> Result<Station, StationRepositoryError> {
            self.stations
                .lock()
                .unwrap()
                .get(&station_id)
                .cloned()
                .ok_or(StationRepositoryError::NotFound(station_id))
        }

        async fn find_capable(
            &self,
            station_type: StationType,
            zone: &str,
        ) -> Result<Vec<Station>, StationRepositoryError> {
            Ok(self
                .stations
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.station_type == station_type && s.zone == zone)
                .cloned()
                .collect())
        }

        async fn compare_and_swap(&self, station: &Station, expected_version: u64) -> Result<(), StationRepositoryError> {
            let mut stations = self.stations.lock().unwrap();
            let current = stations
                .get(&station.station_id)
                .ok_or(StationRepositoryError::NotFound(station.station_id))?;
            if current.version != expected_version {
                return Err(StationRepositoryError::Conflict(station.station_id));
            }
            stations.insert(station.station_id, station.clone());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::in_memory::InMemoryStationRepository;
    use super::*;

    #[tokio::test]
    async fn cas_rejects_stale_version() {
        use crate::domain::ids::StationId as Id;
        use crate::domain::process_path::Requirement;
        use crate::domain::station::StationStatus;

        let station = Station {
            station_id: Id::new(),
            station_type: StationType::Packing,
            zone: "A".into(),
            status: StationStatus::Active,
            capabilities: vec![Requirement::SingleItem],
            max_concurrent_tasks: 2,
            current_tasks: 0,
            assigned_worker_id: None,
            equipment: vec![],
            version: 0,
        };
        let repo = InMemoryStationRepository::default();
        repo.seed(station.clone());

        let mut updated = station.clone();
        updated.increment_tasks().unwrap();
        repo.compare_and_swap(&updated, 0).await.unwrap();

        let mut stale = station.clone();
        stale.increment_tasks().unwrap();
        let err = repo.compare_and_swap(&stale, 0).await.unwrap_err();
        assert!(matches!(err, StationRepositoryError::Conflict(_)));
    }
}
