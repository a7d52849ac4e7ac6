//! Health probe.
//!
//! `GET /api/health` is public: load balancers and the frontend use it to
//! tell "process up, storage down" apart from "process down".

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use super::AppState;

/// Liveness plus a live storage round trip.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.store().ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": true })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "detail": e.to_string() })),
        )
            .into_response(),
    }
}
