//! Route lifecycle endpoints (spec §6.1, §4.4.2-3): instantiate a route from
//! a resolved template, then drive its current stage through assign/start/
//! complete/fail.

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::warn;

use super::errors::{created, ok, ApiError};
use super::AppState;
use crate::domain::ids::{OrderId, PathId, RouteId, TaskId, TemplateId, WaveId, WorkerId};
use crate::domain::process_path::SpecialHandlingTag;
use crate::domain::task_route::TaskRoute;
use crate::outbox::OutboxEvent;

/// Append a route-lifecycle event (spec §4.1 "Created in the same
/// transaction as any aggregate mutation that emits an event"). Best-effort:
/// the route mutation above is already durable, so an append failure is
/// logged rather than rolling back the HTTP response.
async fn append_event(state: &AppState, route: &TaskRoute, event_type: &str, data: serde_json::Value) {
    let event = OutboxEvent::new(event_type.to_string(), route.route_id.to_string(), route.route_id.to_string(), data);
    if let Err(e) = state.outbox.append(event).await {
        warn!(error = %e, route_id = %route.route_id, event_type, "route event append failed");
    }
}

pub fn mutating_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/routes", post(instantiate))
        .route("/api/v1/routes/:route_id/stages/current/assign", post(assign))
        .route("/api/v1/routes/:route_id/stages/current/start", post(start))
        .route("/api/v1/routes/:route_id/stages/current/complete", post(complete))
        .route("/api/v1/routes/:route_id/stages/current/fail", post(fail))
        .route("/api/v1/routes/:route_id/cancel", post(cancel))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/routes/:route_id", get(get_route))
        .route("/api/v1/routes/order/:order_id", get(get_by_order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateRequest {
    pub order_id: OrderId,
    #[serde(default)]
    pub wave_id: Option<WaveId>,
    pub process_path_id: PathId,
    pub template_id: TemplateId,
    #[serde(default)]
    pub special_handling: Vec<SpecialHandlingTag>,
}

async fn instantiate(State(state): State<AppState>, Json(req): Json<InstantiateRequest>) -> Result<Response, ApiError> {
    let template = state.templates.get(req.template_id).await?;
    let route = TaskRoute::instantiate(
        req.order_id,
        req.wave_id,
        req.process_path_id,
        req.special_handling,
        &template,
        chrono::Utc::now(),
    );
    state.routes.insert(&route).await?;
    append_event(
        &state,
        &route,
        "route.created",
        serde_json::json!({ "orderId": route.order_id, "templateId": route.path_template_id }),
    )
    .await;
    Ok(created(route))
}

async fn get_route(State(state): State<AppState>, Path(route_id): Path<RouteId>) -> Result<Response, ApiError> {
    let route = state.routes.get(route_id).await?;
    Ok(ok(route))
}

async fn get_by_order(State(state): State<AppState>, Path(order_id): Path<OrderId>) -> Result<Response, ApiError> {
    let routes = state.routes.get_by_order(order_id).await?;
    Ok(ok(routes))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub worker_id: WorkerId,
    pub task_id: TaskId,
}

async fn assign(
    State(state): State<AppState>,
    Path(route_id): Path<RouteId>,
    Json(req): Json<AssignRequest>,
) -> Result<Response, ApiError> {
    let mut route = state.routes.get(route_id).await?;
    route.assign_worker(req.worker_id, req.task_id)?;
    state.routes.update(&route).await?;
    append_event(
        &state,
        &route,
        "route.stage-assigned",
        serde_json::json!({ "workerId": req.worker_id, "taskId": req.task_id }),
    )
    .await;
    Ok(ok(route))
}

async fn start(State(state): State<AppState>, Path(route_id): Path<RouteId>) -> Result<Response, ApiError> {
    let mut route = state.routes.get(route_id).await?;
    route.start_stage(chrono::Utc::now())?;
    state.routes.update(&route).await?;
    append_event(&state, &route, "route.stage-started", serde_json::json!({})).await;
    Ok(ok(route))
}

async fn complete(State(state): State<AppState>, Path(route_id): Path<RouteId>) -> Result<Response, ApiError> {
    let mut route = state.routes.get(route_id).await?;
    route.complete_stage(chrono::Utc::now())?;
    state.routes.update(&route).await?;
    let event_type = if route.status == crate::domain::task_route::RouteStatus::Completed {
        "route.completed"
    } else {
        "route.stage-completed"
    };
    append_event(&state, &route, event_type, serde_json::json!({})).await;
    Ok(ok(route))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailRequest {
    pub error: String,
}

async fn fail(
    State(state): State<AppState>,
    Path(route_id): Path<RouteId>,
    Json(req): Json<FailRequest>,
) -> Result<Response, ApiError> {
    let mut route = state.routes.get(route_id).await?;
    route.fail_stage(req.error.clone(), chrono::Utc::now())?;
    state.routes.update(&route).await?;
    append_event(&state, &route, "route.stage-failed", serde_json::json!({ "error": req.error })).await;
    Ok(ok(route))
}

async fn cancel(State(state): State<AppState>, Path(route_id): Path<RouteId>) -> Result<Response, ApiError> {
    let mut route = state.routes.get(route_id).await?;
    route.cancel()?;
    state.routes.update(&route).await?;
    append_event(&state, &route, "route.cancelled", serde_json::json!({})).await;
    Ok(ok(route))
}
