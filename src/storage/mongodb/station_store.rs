//! Mongo-backed [`StationRepository`] (spec §5 "Shared resources"):
//! `compare_and_swap` filters on `{station_id, version: expected}` so a
//! concurrent writer's update is rejected rather than silently overwritten.

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::ids::StationId;
use crate::domain::station::{Station, StationType};
use crate::execution_plan::station_store::{StationRepository, StationRepositoryError};

const COLLECTION: &str = "stations";

pub struct MongoStationRepository {
    stations: Collection<Station>,
}

impl MongoStationRepository {
    pub async fn new(database: &Database) -> Result<Self, StationRepositoryError> {
        let stations = database.collection(COLLECTION);
        let repo = Self { stations };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StationRepositoryError> {
        let unique_id = IndexModel::builder()
            .keys(doc! { "station_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.stations
            .create_index(unique_id)
            .await
            .map_err(|e| StationRepositoryError::Storage(e.to_string()))?;
        let by_type_zone = IndexModel::builder()
            .keys(doc! { "station_type": 1, "zone": 1 })
            .build();
        self.stations
            .create_index(by_type_zone)
            .await
            .map_err(|e| StationRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl StationRepository for MongoStationRepository {
    async fn get(&self, station_id: StationId) -> Result<Station, StationRepositoryError> {
        self.stations
            .find_one(doc! { "station_id": station_id.0.to_string() })
            .await
            .map_err(|e| StationRepositoryError::Storage(e.to_string()))?
            .ok_or(StationRepositoryError::NotFound(station_id))
    }

    async fn find_capable(
        &self,
        station_type: StationType,
        zone: &str,
    ) -> Result<Vec<Station>, StationRepositoryError> {
        let station_type = mongodb::bson::to_bson(&station_type)
            .map_err(|e| StationRepositoryError::Storage(e.to_string()))?;
        let filter = doc! { "station_type": station_type, "zone": zone };
        let mut cursor = self
            .stations
            .find(filter)
            .await
            .map_err(|e| StationRepositoryError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| StationRepositoryError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| StationRepositoryError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }

    async fn compare_and_swap(&self, station: &Station, expected_version: u64) -> Result<(), StationRepositoryError> {
        let filter = doc! {
            "station_id": station.station_id.0.to_string(),
            "version": expected_version as i64,
        };
        let result = self
            .stations
            .replace_one(filter, station)
            .await
            .map_err(|e| StationRepositoryError::Storage(e.to_string()))?;
        if result.matched_count == 0 {
            return Err(StationRepositoryError::Conflict(station.station_id));
        }
        Ok(())
    }
}
