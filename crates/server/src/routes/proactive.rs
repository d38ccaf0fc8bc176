// crates/server/src/routes/proactive.rs
//! Proactive suggestion poll.
//!
//! The client polls this independently of its chat turns; the engine
//! re-derives the conversational phase from the freshest history on
//! every call. This route fails open: an unknown session, unreadable
//! turn history, or any other internal fault yields `{none, false}`
//! rather than an error, because proactive help is advisory and must
//! never block the tutoring flow.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;
use study_partner_core::{evaluate, AskState, Suggestion, RECENT_TURN_WINDOW};

/// Request body for POST /api/sessions/{id}/proactive.
///
/// The ask-spacing counters are client-supplied: the engine is stateless
/// between polls and the caller owns the suppression bookkeeping.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProactiveRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub ask_state: AskState,
}

/// POST /api/sessions/{id}/proactive — should the assistant speak first?
pub async fn evaluate_proactive(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ProactiveRequest>,
) -> Json<Suggestion> {
    let session = match state.db.get_session(&id, &req.user_id).await {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(session_id = %id, error = %e, "Proactive poll: session unavailable");
            return Json(Suggestion::none());
        }
    };

    let turns = match state.db.recent_turns(&id, RECENT_TURN_WINDOW).await {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(session_id = %id, error = %e, "Proactive poll: turn history unavailable");
            return Json(Suggestion::none());
        }
    };

    let suggestion = evaluate(&session, &turns, &req.ask_state, state.clock.now());
    if suggestion.should_ask {
        tracing::debug!(
            session_id = %id,
            phase = suggestion.phase.as_str(),
            "Proactive intervention suggested"
        );
    }
    Json(suggestion)
}

/// Create the proactive routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{id}/proactive", post(evaluate_proactive))
}
