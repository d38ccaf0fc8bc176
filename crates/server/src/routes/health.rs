// crates/server/src/routes/health.rs
//! Liveness endpoint.
//!
//! Reports uptime plus a cheap database read: the count of sessions
//! currently holding the one-open-per-user slot. A failing count means
//! the SQLite handle is gone, which is exactly what a health check
//! should surface.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
    pub uptime_secs: u64,
    /// Sessions in ACTIVE or PAUSED across all users.
    pub open_sessions: i64,
}

/// GET /api/health
pub async fn health_check(State(state): State<Arc<AppState>>) -> ApiResult<Json<HealthResponse>> {
    let open_sessions = state.db.count_open_sessions().await?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        open_sessions,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}
