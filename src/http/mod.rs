//! Axum REST gateway (spec §6.1): one module per resource, merged into a
//! single router. Mutating routes are wrapped with the idempotency
//! middleware (spec §4.2); `tower-http` contributes tracing and CORS, the
//! same layers the teacher's topology REST API uses.

pub mod errors;
pub mod execution_plans;
pub mod process_paths;
pub mod routes;
pub mod stations;
pub mod templates;

use std::sync::Arc;

use axum::middleware;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::inventory::InventoryClient;
use crate::clients::labor::LaborClient;
use crate::config::{IdempotencyConfig, RetryPolicyConfig, ThresholdConfig};
use crate::execution_plan::route::RouteRepository;
use crate::execution_plan::station_store::StationRepository;
use crate::execution_plan::template_store::TemplateStore;
use crate::idempotency::middleware::{idempotency_layer, IdempotencyState};
use crate::idempotency::IdempotencyStore;
use crate::outbox::OutboxStore;
use crate::process_path::store::ProcessPathRepository;

/// Shared handler dependencies (spec §9 "config as explicit record" applies
/// to the gateway too: no global statics, everything travels through here).
#[derive(Clone)]
pub struct AppState {
    pub templates: Arc<dyn TemplateStore>,
    pub routes: Arc<dyn RouteRepository>,
    pub stations: Arc<dyn StationRepository>,
    pub process_paths: Arc<dyn ProcessPathRepository>,
    pub labor: Arc<dyn LaborClient>,
    pub inventory: Arc<dyn InventoryClient>,
    pub outbox: Arc<dyn OutboxStore>,
    pub thresholds: ThresholdConfig,
    pub retry: RetryPolicyConfig,
}

/// Assemble the full gateway (spec §6.1 endpoint table). `service_id` scopes
/// idempotency records so two services sharing a store don't collide on key.
pub fn router(
    state: AppState,
    idempotency_store: Arc<dyn IdempotencyStore>,
    idempotency_config: IdempotencyConfig,
    service_id: impl Into<String>,
) -> Router {
    let idempotency_state = IdempotencyState {
        store: idempotency_store,
        config: idempotency_config,
        service_id: service_id.into(),
    };

    let mutating = Router::new()
        .merge(process_paths::mutating_routes())
        .merge(execution_plans::mutating_routes())
        .merge(routes::mutating_routes())
        .merge(stations::mutating_routes())
        .layer(middleware::from_fn_with_state(idempotency_state, idempotency_layer));

    let read_only = Router::new()
        .merge(process_paths::read_routes())
        .merge(routes::read_routes())
        .merge(templates::read_routes());

    Router::new()
        .merge(mutating)
        .merge(read_only)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
