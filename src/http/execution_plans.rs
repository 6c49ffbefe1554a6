//! `POST /api/v1/execution-plans/resolve` — runs C3 (process-path
//! classification) then C4 (template selection), and opportunistically
//! resolves a target station for the first stage that needs one (spec §6.1).

use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::errors::{ok, ApiError};
use super::AppState;
use crate::domain::ids::{PathId, StationId, TemplateId};
use crate::domain::order::{GiftWrapDetails, LineItem, Order};
use crate::domain::process_path::SpecialHandlingTag;
use crate::domain::stage_template::{StageDefinition, StageType};
use crate::domain::station::StationType;
use crate::execution_plan::worker_assignment::pick_capable_station;
use crate::execution_plan::{select_template, SelectionContext};

pub fn mutating_routes() -> Router<AppState> {
    Router::new().route("/api/v1/execution-plans/resolve", post(resolve))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    pub order_id: crate::domain::ids::OrderId,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub gift_wrap: bool,
    #[serde(default)]
    pub gift_wrap_details: Option<GiftWrapDetails>,
    pub total_value: f64,
    #[serde(default)]
    pub multi_zone: bool,
    #[serde(default)]
    pub order_type: Option<String>,
    /// Zone the first station-bound stage should be resolved in.
    pub zone: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub template_id: TemplateId,
    pub path_type: String,
    pub stages: Vec<StageDefinition>,
    pub special_handling: Vec<SpecialHandlingTag>,
    pub target_station: Option<StationId>,
    pub process_path_id: PathId,
}

/// Stage kinds bound to a physical station (spec §3.6); `picking` and
/// `gift_wrap` are worked at the shelf/bench and have no `StationType`.
fn station_type_for(stage_type: StageType) -> Option<StationType> {
    match stage_type {
        StageType::Packing => Some(StationType::Packing),
        StageType::Consolidation | StageType::Walling => Some(StationType::Consolidation),
        StageType::Shipping => Some(StationType::Shipping),
        StageType::Picking | StageType::GiftWrap => None,
    }
}

async fn resolve(State(state): State<AppState>, Json(req): Json<ResolveRequest>) -> Result<Response, ApiError> {
    let order = Order {
        order_id: req.order_id,
        items: req.items,
        gift_wrap: req.gift_wrap,
        gift_wrap_details: req.gift_wrap_details,
        total_value: req.total_value,
        multi_zone: req.multi_zone,
        order_type: req.order_type.clone(),
    };
    let path = crate::process_path::determine(&order, &state.thresholds, chrono::Utc::now());
    state.process_paths.insert(&path).await?;

    let candidates = state.templates.list_all().await?;
    let ctx = SelectionContext {
        item_count: order.item_count(),
        multi_zone: order.multi_zone,
        order_type: order.order_type.as_deref(),
    };
    let default_template = state.templates.default_for("pick_pack").await?;
    let template = select_template(&candidates, &path, ctx, default_template.as_ref());

    let target_station = match template.stages.first().and_then(|s| station_type_for(s.stage_type)) {
        Some(station_type) => {
            match state.stations.find_capable(station_type, &req.zone).await {
                Ok(stations) => pick_capable_station(&stations, station_type, &req.zone, &path.requirements)
                    .ok()
                    .map(|s| s.station_id),
                Err(e) => {
                    debug!(error = %e, "station lookup failed during plan resolution, leaving target unresolved");
                    None
                }
            }
        }
        None => None,
    };

    Ok(ok(ResolveResponse {
        template_id: template.template_id,
        path_type: template.path_type.clone(),
        stages: template.stages.clone(),
        special_handling: path.special_handling.clone(),
        target_station,
        process_path_id: path.path_id,
    }))
}
