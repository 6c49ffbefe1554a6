//! Axum middleware wiring C2 into the REST gateway (spec §6.1: "All
//! mutating routes accept an `Idempotency-Key` header").

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::{hash_body, BeginOutcome, IdempotencyStore, StoredResponse};
use crate::config::IdempotencyConfig;

const HEADER: &str = "idempotency-key";
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct IdempotencyState {
    pub store: Arc<dyn IdempotencyStore>,
    pub config: IdempotencyConfig,
    pub service_id: String,
}

/// Layered in front of mutating routes. Non-mutating verbs, and mutating
/// requests with no key header, pass through untouched (spec §4.2 "keys are
/// optional on non-mutating verbs").
pub async fn idempotency_layer(
    State(state): State<IdempotencyState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(key_header) = request.headers().get(HEADER).cloned() else {
        return next.run(request).await;
    };
    let Ok(key) = key_header.to_str() else {
        return (StatusCode::BAD_REQUEST, "invalid Idempotency-Key header").into_response();
    };
    if key.len() > state.config.max_key_length {
        return (
            StatusCode::BAD_REQUEST,
            format!("Idempotency-Key exceeds max length of {}", state.config.max_key_length),
        )
            .into_response();
    }
    let key = key.to_string();

    let (parts, body) = request.into_parts();
    let body_bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            return (StatusCode::BAD_REQUEST, format!("failed to read request body: {e}")).into_response();
        }
    };
    let body_hash = hash_body(&body_bytes);

    let outcome = state
        .store
        .begin(&state.service_id, &key, &body_hash, state.config.ttl_hours)
        .await;

    match outcome {
        Ok(BeginOutcome::Replay(stored)) => return stored_response_into_response(stored),
        Ok(BeginOutcome::Proceed) => {}
        Err(super::IdempotencyError::InFlight(_)) => {
            return (StatusCode::CONFLICT, "request with this idempotency key is already in flight").into_response();
        }
        Err(super::IdempotencyError::BodyMismatch(_)) => {
            return (
                StatusCode::CONFLICT,
                "idempotency key was previously used with a different request body",
            )
                .into_response();
        }
        Err(e) => {
            warn!(error = %e, "idempotency store error");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (resp_parts, resp_body) = response.into_parts();
    let resp_bytes = match to_bytes(resp_body, MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            warn!(error = %e, "failed to buffer response for idempotency store");
            if let Err(e) = state.store.release(&state.service_id, &key).await {
                warn!(error = %e, "failed to release idempotency lock after response-buffering error");
            }
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let stored = StoredResponse {
        status: resp_parts.status.as_u16(),
        headers: resp_parts
            .headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect(),
        body: resp_bytes.to_vec(),
    };

    if resp_parts.status.is_success() {
        if let Err(e) = state.store.complete(&state.service_id, &key, stored.clone()).await {
            warn!(error = %e, "failed to persist idempotency completion");
        }
    } else if let Err(e) = state.store.release(&state.service_id, &key).await {
        warn!(error = %e, "failed to release idempotency lock after handler failure");
    }

    stored_response_into_response(stored)
}

fn stored_response_into_response(stored: StoredResponse) -> Response {
    let mut builder = Response::builder().status(stored.status);
    for (name, value) in &stored.headers {
        if let Ok(value) = HeaderValue::from_str(value) {
            builder = builder.header(name, value);
        }
    }
    builder.body(Body::from(stored.body)).unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
