//! Mongo-backed [`RouteRepository`] (spec §6.4: per-aggregate `status`,
//! `orderId`, `waveId` indexes).

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};

use crate::domain::ids::{OrderId, RouteId};
use crate::domain::task_route::TaskRoute;
use crate::execution_plan::route::{RouteRepository, RouteRepositoryError};

const COLLECTION: &str = "task_routes";

pub struct MongoRouteRepository {
    routes: Collection<TaskRoute>,
}

impl MongoRouteRepository {
    pub async fn new(database: &Database) -> Result<Self, RouteRepositoryError> {
        let routes = database.collection(COLLECTION);
        let repo = Self { routes };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), RouteRepositoryError> {
        let unique_id = IndexModel::builder()
            .keys(doc! { "route_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.routes
            .create_index(unique_id)
            .await
            .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?;
        let by_order = IndexModel::builder().keys(doc! { "order_id": 1 }).build();
        self.routes
            .create_index(by_order)
            .await
            .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?;
        let by_status = IndexModel::builder().keys(doc! { "status": 1 }).build();
        self.routes
            .create_index(by_status)
            .await
            .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl RouteRepository for MongoRouteRepository {
    async fn insert(&self, route: &TaskRoute) -> Result<(), RouteRepositoryError> {
        self.routes
            .insert_one(route)
            .await
            .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn update(&self, route: &TaskRoute) -> Result<(), RouteRepositoryError> {
        self.routes
            .replace_one(doc! { "route_id": route.route_id.0.to_string() }, route)
            .await
            .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, route_id: RouteId) -> Result<TaskRoute, RouteRepositoryError> {
        self.routes
            .find_one(doc! { "route_id": route_id.0.to_string() })
            .await
            .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?
            .ok_or(RouteRepositoryError::NotFound(route_id))
    }

    async fn get_by_order(&self, order_id: OrderId) -> Result<Vec<TaskRoute>, RouteRepositoryError> {
        let mut cursor = self
            .routes
            .find(doc! { "order_id": order_id.0.to_string() })
            .await
            .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?;
        let mut out = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?
        {
            out.push(
                cursor
                    .deserialize_current()
                    .map_err(|e| RouteRepositoryError::Storage(e.to_string()))?,
            );
        }
        Ok(out)
    }
}
