//! TaskRoute repository (spec §6.4: one document per route, keyed by
//! `routeId`, with secondary indexes on `status`/`orderId`/`waveId`).

use async_trait::async_trait;

use crate::domain::ids::{OrderId, RouteId};
use crate::domain::task_route::TaskRoute;

#[derive(Debug, thiserror::Error)]
pub enum RouteRepositoryError {
    #[error("route {0} not found")]
    NotFound(RouteId),
    #[error("storage error: {0}")]
    Storage(String),
}

#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn insert(&self, route: &TaskRoute) -> Result<(), RouteRepositoryError>;
    async fn update(&self, route: &TaskRoute) -> Result<(), RouteRepositoryError>;
    async fn get(&self, route_id: RouteId) -> Result<TaskRoute, RouteRepositoryError>;
    async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<TaskRoute>, RouteRepositoryError>;
}

/// In-memory repository: used by this module's own tests, and as the
/// storage backend for the `dev` feature build (spec §6.5 "local
/// development, no external services").
pub mod in_memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct InMemoryRouteRepository {
        routes: Mutex<HashMap<RouteId, TaskRoute>>,
    }

    #[async_trait]
    impl RouteRepository for InMemoryRouteRepository {
        async fn insert(&self, route: &TaskRoute) -> Result<(), RouteRepositoryError> {
            self.routes.lock().unwrap().insert(route.route_id, route.clone());
            Ok(())
        }

        async fn update(&self, route: &TaskRoute) -> Result<(), RouteRepositoryError> {
            let mut routes = self.routes.lock().unwrap();
            if !routes.contains_key(&route.route_id) {
                return Err(RouteRepositoryError::NotFound(route.route_id));
            }
            routes.insert(route.route_id, route.clone());
            Ok(())
        }

        async fn get(&self, route_id: RouteId) -> Result<TaskRoute, RouteRepositoryError> {
            self.routes
                .lock()
                .unwrap()
                .get(&route_id)
                .cloned()
                .ok_or(RouteRepositoryError::NotFound(route_id))
        }

        async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<TaskRoute>, RouteRepositoryError> {
            Ok(self
                .routes
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.order_id == order_id)
                .cloned()
                .collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::in_memory::InMemoryRouteRepository;
    use super::*;

    #[tokio::test]
    async fn insert_then_get_round_trips() {
        use crate::domain::ids::{PathId, TemplateId};
        use crate::domain::stage_template::{SelectionCriteria, StageDefinition, StageType};
        use crate::domain::stage_template::StageTemplate;

        let template = StageTemplate {
            template_id: TemplateId::new(),
            path_type: "pick_pack".into(),
            stages: vec![StageDefinition {
                order: 0,
                stage_type: StageType::Picking,
                task_type: "pick".into(),
                required: true,
                timeout_mins: 30,
                config: serde_json::Value::Null,
            }],
            selection_criteria: SelectionCriteria {
                min_items: 0,
                max_items: 10,
                requires_multi_zone: false,
                order_types: vec![],
                priority: 0,
            },
            is_default: true,
            active: true,
        };
        let order_id = OrderId::new();
        let route = TaskRoute::instantiate(order_id, None, PathId::new(), vec![], &template, chrono::Utc::now());

        let repo = InMemoryRouteRepository::default();
        repo.insert(&route).await.unwrap();
        let fetched = repo.get(route.route_id).await.unwrap();
        assert_eq!(fetched.route_id, route.route_id);

        let by_order = repo.get_by_order(order_id).await.unwrap();
        assert_eq!(by_order.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_route_errors() {
        let repo = InMemoryRouteRepository::default();
        let err = repo.get(RouteId::new()).await.unwrap_err();
        assert!(matches!(err, RouteRepositoryError::NotFound(_)));
    }

    /// Workflow replay safety (spec P9): a reconstructed route resumes at
    /// `current_stage_idx` and doesn't repeat the prior stage's transitions.
    /// Durability here comes entirely from persisting `TaskRoute` after every
    /// transition — there's no separate replay log to reconcile, so
    /// "resuming after a crash" is just "load the route and keep driving it".
    #[tokio::test]
    async fn resuming_from_a_persisted_route_continues_at_the_correct_stage() {
        use crate::domain::ids::{PathId, TaskId, TemplateId, WorkerId};
        use crate::domain::stage_template::{SelectionCriteria, StageDefinition, StageTemplate, StageType};
        use crate::domain::task_route::{RouteStatus, StageStatus};

        let template = StageTemplate {
            template_id: TemplateId::new(),
            path_type: "pick_pack".into(),
            stages: vec![
                StageDefinition {
                    order: 0,
                    stage_type: StageType::Picking,
                    task_type: "pick".into(),
                    required: true,
                    timeout_mins: 30,
                    config: serde_json::Value::Null,
                },
                StageDefinition {
                    order: 1,
                    stage_type: StageType::Packing,
                    task_type: "pack".into(),
                    required: true,
                    timeout_mins: 30,
                    config: serde_json::Value::Null,
                },
            ],
            selection_criteria: SelectionCriteria {
                min_items: 0,
                max_items: 10,
                requires_multi_zone: false,
                order_types: vec![],
                priority: 0,
            },
            is_default: true,
            active: true,
        };
        let route_id;
        let repo = InMemoryRouteRepository::default();
        let now = chrono::Utc::now();

        {
            let mut route = TaskRoute::instantiate(OrderId::new(), None, PathId::new(), vec![], &template, now);
            route_id = route.route_id;
            repo.insert(&route).await.unwrap();

            route.assign_worker(WorkerId::new(), TaskId::new()).unwrap();
            repo.update(&route).await.unwrap();
            route.start_stage(now).unwrap();
            repo.update(&route).await.unwrap();
            route.complete_stage(now).unwrap();
            repo.update(&route).await.unwrap();
            // `route` is dropped here, simulating a process restart: nothing
            // survives in memory, only what was persisted via `repo.update`.
        }

        let mut resumed = repo.get(route_id).await.unwrap();
        assert_eq!(resumed.current_stage_idx, 1);
        assert_eq!(resumed.stages[0].status, StageStatus::Completed);
        assert_eq!(resumed.current_stage().unwrap().stage_type, StageType::Packing);

        // Drive the remaining stage exactly as the workflow loop would,
        // without touching stage 0's already-terminal state.
        resumed.assign_worker(WorkerId::new(), TaskId::new()).unwrap();
        repo.update(&resumed).await.unwrap();
        resumed.start_stage(now).unwrap();
        repo.update(&resumed).await.unwrap();
        resumed.complete_stage(now).unwrap();
        repo.update(&resumed).await.unwrap();

        let final_route = repo.get(route_id).await.unwrap();
        assert_eq!(final_route.status, RouteStatus::Completed);
        assert_eq!(final_route.stages[0].status, StageStatus::Completed);
        assert_eq!(final_route.stages[1].status, StageStatus::Completed);
    }
}
