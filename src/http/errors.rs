//! Unified HTTP error envelope (spec §6.1, §7): every handler error maps to
//! `{data: null, error: {code, message, details}}`, with the status code set
//! by the error's taxonomy kind, never by the handler itself.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::clients::inventory::InventoryError;
use crate::clients::labor::LaborError;
use crate::domain::pack_task::PackTaskError;
use crate::domain::station::StationError;
use crate::domain::task_route::StageTransitionError;
use crate::execution_plan::route::RouteRepositoryError;
use crate::execution_plan::station_store::StationRepositoryError;
use crate::execution_plan::template_store::TemplateStoreError;
use crate::execution_plan::worker_assignment::AssignmentError;
use crate::idempotency::IdempotencyError;
use crate::process_path::store::ProcessPathRepositoryError;
use crate::workflows::WorkflowError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Wraps the taxonomy kind (spec §7) alongside the status it maps to, so
/// every call site produces the envelope the same way.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(json!({ "data": null, "error": self.body }))).into_response()
    }
}

/// Wrap a successful body in the standard envelope (spec §6.1: `{data, error}`).
pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(json!({ "data": data, "error": null }))).into_response()
}

/// Same as [`ok`] but with a `201 Created` status, for creation endpoints.
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(json!({ "data": data, "error": null }))).into_response()
}

impl From<RouteRepositoryError> for ApiError {
    fn from(err: RouteRepositoryError) -> Self {
        match err {
            RouteRepositoryError::NotFound(id) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("route {id} not found")),
            RouteRepositoryError::Storage(msg) => Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", msg),
        }
    }
}

impl From<TemplateStoreError> for ApiError {
    fn from(err: TemplateStoreError) -> Self {
        match err {
            TemplateStoreError::NotFound(id) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("template {id} not found")),
            TemplateStoreError::Storage(msg) => Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", msg),
        }
    }
}

impl From<StationRepositoryError> for ApiError {
    fn from(err: StationRepositoryError) -> Self {
        match err {
            StationRepositoryError::NotFound(id) => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("station {id} not found")),
            StationRepositoryError::Conflict(id) => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", format!("station {id} was concurrently modified, retry"))
            }
            StationRepositoryError::Storage(msg) => Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", msg),
        }
    }
}

impl From<ProcessPathRepositoryError> for ApiError {
    fn from(err: ProcessPathRepositoryError) -> Self {
        match err {
            ProcessPathRepositoryError::NotFound(id) => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", format!("no process path recorded for order {id}"))
            }
            ProcessPathRepositoryError::Storage(msg) => Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", msg),
        }
    }
}

impl From<StageTransitionError> for ApiError {
    fn from(err: StageTransitionError) -> Self {
        match err {
            StageTransitionError::RouteTerminal { .. } => Self::new(StatusCode::CONFLICT, "CONFLICT", err.to_string()),
            StageTransitionError::NoCurrentStage { .. } | StageTransitionError::IllegalTransition { .. } => {
                Self::validation(err.to_string())
            }
        }
    }
}

impl From<StationError> for ApiError {
    fn from(err: StationError) -> Self {
        match err {
            StationError::AtCapacity(..) => Self::new(StatusCode::CONFLICT, "CONFLICT", err.to_string()),
            StationError::NotActive(_) | StationError::MissingCapabilities(_) => Self::validation(err.to_string()),
        }
    }
}

impl From<PackTaskError> for ApiError {
    fn from(err: PackTaskError) -> Self {
        Self::validation(err.to_string())
    }
}

impl From<LaborError> for ApiError {
    fn from(err: LaborError) -> Self {
        match err {
            LaborError::NoneAvailable(_) => Self::new(StatusCode::CONFLICT, "CONFLICT", err.to_string()),
            LaborError::Request(_) | LaborError::Response { .. } => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE", err.to_string())
            }
        }
    }
}

impl From<InventoryError> for ApiError {
    fn from(err: InventoryError) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "UPSTREAM_UNAVAILABLE", err.to_string())
    }
}

impl From<AssignmentError> for ApiError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::Labor(e) => e.into(),
            AssignmentError::NoCapableStation { .. } => Self::new(StatusCode::CONFLICT, "CONFLICT", err.to_string()),
        }
    }
}

impl From<IdempotencyError> for ApiError {
    fn from(err: IdempotencyError) -> Self {
        match err {
            IdempotencyError::InFlight(_) | IdempotencyError::BodyMismatch(_) => {
                Self::new(StatusCode::CONFLICT, "CONFLICT", err.to_string())
            }
            IdempotencyError::KeyTooLong(_) => Self::validation(err.to_string()),
            IdempotencyError::Storage(msg) => Self::new(StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", msg),
        }
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Route(e) => e.into(),
            WorkflowError::RouteRepository(e) => e.into(),
            WorkflowError::Template(e) => e.into(),
            WorkflowError::Station(e) => e.into(),
            WorkflowError::Assignment(e) => e.into(),
            WorkflowError::Inventory(e) => e.into(),
            WorkflowError::Labor(e) => e.into(),
            WorkflowError::Pack(e) => e.into(),
            WorkflowError::TimedOut(..) => Self::new(StatusCode::SERVICE_UNAVAILABLE, "TIMED_OUT", err.to_string()),
            WorkflowError::AlreadyShipped => Self::new(StatusCode::CONFLICT, "CONFLICT", err.to_string()),
            WorkflowError::MissingSignalChannel(_) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", err.to_string())
            }
        }
    }
}
