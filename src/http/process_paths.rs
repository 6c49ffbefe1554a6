//! `POST /api/v1/process-paths/determine`, `GET .../order/{orderId}` (spec §6.1).

use axum::extract::{Path, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::errors::{created, ok, ApiError};
use super::AppState;
use crate::domain::ids::{OrderId, PathId};
use crate::domain::order::{GiftWrapDetails, LineItem, Order};
use crate::domain::process_path::{ProcessPath, Requirement, SpecialHandlingTag};

pub fn mutating_routes() -> Router<AppState> {
    Router::new().route("/api/v1/process-paths/determine", post(determine))
}

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/api/v1/process-paths/order/:order_id", get(get_by_order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetermineRequest {
    pub order_id: OrderId,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub gift_wrap: bool,
    #[serde(default)]
    pub gift_wrap_details: Option<GiftWrapDetails>,
    pub total_value: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetermineResponse {
    pub path_id: PathId,
    pub requirements: Vec<Requirement>,
    pub special_handling: Vec<SpecialHandlingTag>,
}

impl From<&ProcessPath> for DetermineResponse {
    fn from(p: &ProcessPath) -> Self {
        Self {
            path_id: p.path_id,
            requirements: p.requirements.clone(),
            special_handling: p.special_handling.clone(),
        }
    }
}

async fn determine(State(state): State<AppState>, Json(req): Json<DetermineRequest>) -> Result<Response, ApiError> {
    let order = Order {
        order_id: req.order_id,
        items: req.items,
        gift_wrap: req.gift_wrap,
        gift_wrap_details: req.gift_wrap_details,
        total_value: req.total_value,
        multi_zone: false,
        order_type: None,
    };
    let path = crate::process_path::determine(&order, &state.thresholds, chrono::Utc::now());
    state.process_paths.insert(&path).await?;
    Ok(created(DetermineResponse::from(&path)))
}

async fn get_by_order(State(state): State<AppState>, Path(order_id): Path<OrderId>) -> Result<Response, ApiError> {
    let path = state.process_paths.get_by_order(order_id).await?;
    Ok(ok(path))
}
