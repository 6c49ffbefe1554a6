//! Mongo-backed [`ShipmentRepository`] (spec §6.4: per-aggregate
//! collection, `shipmentId`/`orderId` indexes).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::ids::{OrderId, ShipmentId};
use crate::domain::shipment::Shipment;
use crate::execution_plan::shipment_store::{ShipmentRepository, ShipmentRepositoryError};

const COLLECTION: &str = "shipments";

pub struct MongoShipmentRepository {
    shipments: Collection<Shipment>,
}

impl MongoShipmentRepository {
    pub async fn new(database: &Database) -> Result<Self, ShipmentRepositoryError> {
        let shipments = database.collection(COLLECTION);
        let repo = Self { shipments };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), ShipmentRepositoryError> {
        let unique_id = IndexModel::builder()
            .keys(doc! { "shipment_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.shipments
            .create_index(unique_id)
            .await
            .map_err(|e| ShipmentRepositoryError::Storage(e.to_string()))?;
        let by_order = IndexModel::builder().keys(doc! { "order_id": 1 }).build();
        self.shipments
            .create_index(by_order)
            .await
            .map_err(|e| ShipmentRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ShipmentRepository for MongoShipmentRepository {
    async fn insert(&self, shipment: &Shipment) -> Result<(), ShipmentRepositoryError> {
        self.shipments
            .insert_one(shipment)
            .await
            .map_err(|e| ShipmentRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, shipment: &Shipment) -> Result<(), ShipmentRepositoryError> {
        self.shipments
            .replace_one(doc! { "shipment_id": shipment.shipment_id.0.to_string() }, shipment)
            .await
            .map_err(|e| ShipmentRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, shipment_id: ShipmentId) -> Result<Shipment, ShipmentRepositoryError> {
        self.shipments
            .find_one(doc! { "shipment_id": shipment_id.0.to_string() })
            .await
            .map_err(|e| ShipmentRepositoryError::Storage(e.to_string()))?
            .ok_or(ShipmentRepositoryError::NotFound(shipment_id))
    }

    async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<Shipment>, ShipmentRepositoryError> {
        let mut cursor = self
            .shipments
            .find(doc! { "order_id": order_id.0.to_string() })
            .await
            .map_err(|e| ShipmentRepositoryError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| ShipmentRepositoryError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| ShipmentRepositoryError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }
}
