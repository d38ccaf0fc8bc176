// crates/server/src/routes/sessions.rs
//! Session lifecycle routes.
//!
//! - POST /sessions                    — create (ACTIVE)
//! - GET  /sessions/{id}               — fetch one session
//! - POST /sessions/{id}/pause         — ACTIVE → PAUSED
//! - POST /sessions/{id}/resume        — PAUSED → ACTIVE
//! - POST /sessions/{id}/complete      — ACTIVE|PAUSED → COMPLETED
//! - POST /sessions/complete-all       — bulk opt-out

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use study_partner_core::{SessionParams, TutorSession};

/// Request body for POST /api/sessions.
///
/// Auth lives in the surrounding platform; the gateway forwards the
/// verified caller as `userId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub params: SessionParams,
}

/// Body for the ownership-scoped transition routes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerBody {
    pub user_id: String,
}

/// Query for GET /api/sessions/{id}.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub user_id: String,
}

/// Response for POST /api/sessions/{id}/resume. The `welcome_back` cue
/// tells the response layer to greet the learner; the copy itself is
/// generated there, not here.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    pub session: TutorSession,
    pub welcome_back: bool,
}

/// Response for POST /api/sessions/complete-all.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct CompleteAllResponse {
    pub sessions_ended: u64,
}

/// POST /api/sessions — create a new ACTIVE session.
///
/// 409 with `existingSessionId` when the user already has an open one.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<TutorSession>)> {
    if req.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("userId must not be empty".to_string()));
    }

    let now_ts = state.clock.now_ts();
    let session = state
        .db
        .create_session(&req.user_id, &req.params, now_ts)
        .await?;

    tracing::info!(
        session_id = %session.id,
        user_id = %session.user_id,
        subject = session.subject.as_deref().unwrap_or("-"),
        "Tutor session started"
    );
    state.notifier.session_started(&session);

    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/sessions/{id}?userId=…
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> ApiResult<Json<TutorSession>> {
    let session = state.db.get_session(&id, &query.user_id).await?;
    Ok(Json(session))
}

/// POST /api/sessions/{id}/pause
pub async fn pause_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<OwnerBody>,
) -> ApiResult<Json<TutorSession>> {
    let session = state.db.pause(&id, &body.user_id).await?;
    tracing::info!(session_id = %session.id, "Tutor session paused");
    Ok(Json(session))
}

/// POST /api/sessions/{id}/resume
pub async fn resume_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<OwnerBody>,
) -> ApiResult<Json<ResumeResponse>> {
    let session = state.db.resume(&id, &body.user_id).await?;
    tracing::info!(session_id = %session.id, "Tutor session resumed");
    Ok(Json(ResumeResponse {
        session,
        welcome_back: true,
    }))
}

/// POST /api/sessions/{id}/complete
pub async fn complete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<OwnerBody>,
) -> ApiResult<Json<TutorSession>> {
    let now_ts = state.clock.now_ts();
    let session = state.db.complete(&id, &body.user_id, now_ts).await?;
    tracing::info!(
        session_id = %session.id,
        duration_secs = session.total_duration_seconds.unwrap_or(0),
        "Tutor session completed"
    );
    Ok(Json(session))
}

/// POST /api/sessions/complete-all — end every open session for a user.
pub async fn complete_all(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OwnerBody>,
) -> ApiResult<Json<CompleteAllResponse>> {
    let now_ts = state.clock.now_ts();
    let sessions_ended = state.db.complete_all(&body.user_id, now_ts).await?;
    if sessions_ended > 0 {
        tracing::info!(user_id = %body.user_id, sessions_ended, "Bulk session completion");
    }
    Ok(Json(CompleteAllResponse { sessions_ended }))
}

/// Create the session routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/complete-all", post(complete_all))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/pause", post(pause_session))
        .route("/sessions/{id}/resume", post(resume_session))
        .route("/sessions/{id}/complete", post(complete_session))
}
