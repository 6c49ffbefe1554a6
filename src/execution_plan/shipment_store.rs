//! Shipment repository (spec §3.5, §6.4: stage-specific aggregates own
//! their collection, keyed by `shipmentId` with a secondary index on
//! `orderId`).

use async_trait::async_trait;

use crate::domain::ids::{OrderId, ShipmentId};
use crate::domain::shipment::Shipment;

#[derive(Debug, thiserror::Error)]
pub enum ShipmentRepositoryError {
    #[error("shipment {0} not found")]
    NotFound(ShipmentId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    async fn insert(&self, shipment: &Shipment) -> Result<(), ShipmentRepositoryError>;
    async fn update(&self, shipment: &Shipment) -> Result<(), ShipmentRepositoryError>;
    async fn get(&self, shipment_id: ShipmentId) -> Result<Shipment, ShipmentRepositoryError>;
    async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<Shipment>, ShipmentRepositoryError>;
}

/// In-memory repository: used by this module's own tests, and as the
/// storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryShipmentRepository {
        shipments: Mutex<HashMap<ShipmentId, Shipment>>,
    }

    #[async_trait]
    impl ShipmentRepository for InMemoryShipmentRepository {
        async fn insert(&self, shipment: &Shipment) -> Result<(), ShipmentRepositoryError> {
            self.shipments.lock().unwrap().insert(shipment.shipment_id, shipment.clone());
            Ok(())
        }

        async fn update(&self, shipment: &Shipment) -> Result<(), ShipmentRepositoryError> {
            let mut shipments = self.shipments.lock().unwrap();
            if !shipments.contains_key(&shipment.shipment_id) {
                return Err(ShipmentRepositoryError::NotFound(shipment.shipment_id));
            }
            shipments.insert(shipment.shipment_id, shipment.clone());
            Ok(())
        }

        async fn get(&self, shipment_id: ShipmentId) -> Result<Shipment, ShipmentRepositoryError> {
            self.shipments
                .lock()
                .unwrap()
                .get(&shipment_id)
                .cloned()
                .ok_or(ShipmentRepositoryError::NotFound(shipment_id))
        }

        async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<Shipment>, ShipmentRepositoryError> {
            Ok(self
                .shipments
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.order_id == order_id)
                .cloned()
                .collect())
        }
    }
}
