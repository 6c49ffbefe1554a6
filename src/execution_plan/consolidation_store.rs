//! ConsolidationUnit repository (spec §3.5, §6.4: stage-specific
//! aggregates own their collection, keyed by `consolidationId` with a
//! secondary index on `orderId`).

use async_trait::async_trait;

use crate::domain::consolidation_unit::ConsolidationUnit;
use crate::domain::ids::{ConsolidationId, OrderId};

#[derive(Debug, thiserror::Error)]
pub enum ConsolidationRepositoryError {
    #[error("consolidation unit {0} not found")]
    NotFound(ConsolidationId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait ConsolidationRepository: Send + Sync {
    async fn insert(&self, unit: &ConsolidationUnit) -> Result<(), ConsolidationRepositoryError>;
    async fn update(&self, unit: &ConsolidationUnit) -> Result<(), ConsolidationRepositoryError>;
    async fn get(&self, consolidation_id: ConsolidationId) -> Result<ConsolidationUnit, ConsolidationRepositoryError>;
    async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<ConsolidationUnit>, ConsolidationRepositoryError>;
}

/// In-memory repository: used by this module's own tests, and as the
/// storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryConsolidationRepository {
        units: Mutex<HashMap<ConsolidationId, ConsolidationUnit>>,
    }

    #[async_trait]
    impl ConsolidationRepository for InMemoryConsolidationRepository {
        async fn insert(&self, unit: &ConsolidationUnit) -> Result<(), ConsolidationRepositoryError> {
            self.units.lock().unwrap().insert(unit.consolidation_id, unit.clone());
            Ok(())
        }

        async fn update(&self, unit: &ConsolidationUnit) -> Result<(), ConsolidationRepositoryError> {
            let mut units = self.units.lock().unwrap();
            if !units.contains_key(&unit.consolidation_id) {
                return Err(ConsolidationRepositoryError::NotFound(unit.consolidation_id));
            }
            units.insert(unit.consolidation_id, unit.clone());
            Ok(())
        }

        async fn get(&self, consolidation_id: ConsolidationId) -> Result<ConsolidationUnit, ConsolidationRepositoryError> {
            self.units
                .lock()
                .unwrap()
                .get(&consolidation_id)
                .cloned()
                .ok_or(ConsolidationRepositoryError::NotFound(consolidation_id))
        }

        async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<ConsolidationUnit>, ConsolidationRepositoryError> {
            Ok(self
                .units
                .lock()
                .unwrap()
                .values()
                .filter(|u| u.order_id == order_id)
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::in_memory::InMemoryConsolidationRepository;
    use super::*;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        let order_id = OrderId::new();
        let unit = ConsolidationUnit::new(order_id, None, 2);

        let repo = InMemoryConsolidationRepository::default();
        repo.insert(&unit).await.unwrap();
        let fetched = repo.get(unit.consolidation_id).await.unwrap();
        assert_eq!(fetched.consolidation_id, unit.consolidation_id);

        let by_order = repo.get_by_order(order_id).await.unwrap();
        assert_eq!(by_order.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_unit_errors() {
        let repo = InMemoryConsolidationRepository::default();
        let err = repo.get(ConsolidationId::new()).await.unwrap_err();
        assert!(matches!(err, ConsolidationRepositoryError::NotFound(_)));
    }
}
