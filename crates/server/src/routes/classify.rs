// crates/server/src/routes/classify.rs
//! Homework-intent classification route.
//!
//! - POST /classify — score one message for answer-seeking intent

use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;
use study_partner_core::{classify_intent, IntentVerdict};

/// Request body for POST /api/classify.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub message: String,
}

/// Response for POST /api/classify: the verdict plus the directive the
/// response layer prepends to its model instructions when set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    #[serde(flatten)]
    pub verdict: IntentVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard_directive: Option<&'static str>,
}

/// POST /api/classify — stateless, never errors.
pub async fn classify(Json(req): Json<ClassifyRequest>) -> Json<ClassifyResponse> {
    let verdict = classify_intent(&req.message);
    if verdict.is_answer_seeking {
        tracing::info!(
            confidence = verdict.confidence.as_str(),
            patterns = ?verdict.matched_patterns,
            "Answer-seeking message flagged"
        );
    }
    let guard_directive = verdict.guard_directive();
    Json(ClassifyResponse {
        verdict,
        guard_directive,
    })
}

/// Create the classify routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/classify", post(classify))
}
