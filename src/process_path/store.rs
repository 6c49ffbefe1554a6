//! Persisted classification lookups (spec §6.1 "GET prior classification",
//! §6.4 per-aggregate `orderId` index). `determine` itself stays pure; this
//! is purely the read-after-write path for the HTTP gateway.

use async_trait::async_trait;

use crate::domain::ids::OrderId;
use crate::domain::process_path::ProcessPath;

#[derive(Debug, thiserror::Error)]
pub enum ProcessPathRepositoryError {
    #[error("no process path recorded for order {0}")]
    NotFound(OrderId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait ProcessPathRepository: Send + Sync {
    async fn insert(&self, path: &ProcessPath) -> Result<(), ProcessPathRepositoryError>;
    async fn get_by_order(&self, order_id: OrderId) -> Result<ProcessPath, ProcessPathRepositoryError>;
}

/// In-memory repository: used by this module's own tests, and as the
/// storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryProcessPathRepository {
        paths: Mutex<HashMap<OrderId, ProcessPath>>,
    }

    #[async_trait]
    impl ProcessPathRepository for InMemoryProcessPathRepository {
        async fn insert(&self, path: &ProcessPath) -> Result<(), ProcessPathRepositoryError> {
            self.paths.lock().unwrap().insert(path.order_id, path.clone());
            Ok(())
        }

        async fn get_by_order(&self, order_id: OrderId) -> Result<ProcessPath, ProcessPathRepositoryError> {
            self.paths
                .lock()
                .unwrap()
                .get(&order_id)
                .cloned()
                .ok_or(ProcessPathRepositoryError::NotFound(order_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::in_memory::InMemoryProcessPathRepository;
    use super::*;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        use crate::domain::ids::PathId;

        let repo = InMemoryProcessPathRepository::default();
        let order_id = OrderId::new();
        let path = ProcessPath {
            path_id: PathId::new(),
            order_id,
            requirements: vec![],
            consolidation_required: false,
            gift_wrap_required: false,
            special_handling: vec![],
            target_station_id: None,
            created_at: chrono::Utc::now(),
        };
        repo.insert(&path).await.unwrap();
        let fetched = repo.get_by_order(order_id).await.unwrap();
        assert_eq!(fetched.path_id, path.path_id);
    }

    #[tokio::test]
    async fn missing_order_errors() {
        let repo = InMemoryProcessPathRepository::default();
        let err = repo.get_by_order(OrderId::new()).await.unwrap_err();
        assert!(matches!(err, ProcessPathRepositoryError::NotFound(_)));
    }
}
