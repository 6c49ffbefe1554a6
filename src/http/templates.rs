//! Read-only template catalog endpoints (spec §6.1).

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use super::errors::{ok, ApiError};
use super::AppState;
use crate::domain::ids::TemplateId;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/templates", get(list))
        .route("/api/v1/templates/:template_id", get(get_one))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub path_type: Option<String>,
}

async fn list(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Result<Response, ApiError> {
    let templates = match q.path_type {
        Some(path_type) => state.templates.list_active(&path_type).await?,
        None => state.templates.list_all().await?,
    };
    Ok(ok(templates))
}

async fn get_one(State(state): State<AppState>, Path(template_id): Path<TemplateId>) -> Result<Response, ApiError> {
    let template = state.templates.get(template_id).await?;
    Ok(ok(template))
}
