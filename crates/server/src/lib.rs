// crates/server/src/lib.rs
//! Study-partner server library.
//!
//! Axum HTTP surface for the AI study-partner session engine: session
//! lifecycle, the proactive suggestion poll, and homework-intent
//! classification.

pub mod error;
pub mod notify;
pub mod routes;
pub mod state;
pub mod sweeper;

pub use error::*;
pub use notify::Notifier;
pub use routes::api_routes;
pub use state::AppState;
pub use sweeper::spawn_expiry_sweep;

use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, sessions, proactive, classify)
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use serde_json::{json, Value};
    use study_partner_core::Clock;
    use study_partner_db::Database;
    use tower::ServiceExt;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn test_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    async fn test_app_at(now: DateTime<Utc>) -> (Router, Database) {
        let db = Database::new_in_memory().await.expect("in-memory DB");
        let state = AppState::with_parts(
            db.clone(),
            std::sync::Arc::new(FixedClock(now)),
            Notifier::disabled(),
        );
        (create_app(state), db)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        split(response).await
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        split(response).await
    }

    async fn split(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_endpoint_counts_open_sessions() {
        let (app, _db) = test_app_at(test_time()).await;
        let (status, body) = get(&app, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["version"].is_string());
        assert_eq!(body["openSessions"], 0);

        post(&app, "/api/sessions", json!({"userId": "u1"})).await;
        let (_, body) = get(&app, "/api/health").await;
        assert_eq!(body["openSessions"], 1);
    }

    #[tokio::test]
    async fn test_create_session_rejects_blank_user_id() {
        let (app, _db) = test_app_at(test_time()).await;
        let (status, body) = post(&app, "/api/sessions", json!({"userId": "  "})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Bad request");
        assert!(body["details"].as_str().unwrap().contains("userId"));
    }

    #[tokio::test]
    async fn test_create_session_and_conflict() {
        let (app, _db) = test_app_at(test_time()).await;

        let (status, body) = post(
            &app,
            "/api/sessions",
            json!({"userId": "u1", "subject": "Algebra", "linkStudySession": true}),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "active");
        assert_eq!(body["userId"], "u1");
        let id = body["id"].as_str().unwrap().to_string();

        // Double-tap create: 409 with the existing id for "resume instead".
        let (status, body) = post(&app, "/api/sessions", json!({"userId": "u1"})).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["existingSessionId"], id.as_str());
    }

    #[tokio::test]
    async fn test_pause_resume_lifecycle_over_http() {
        let (app, _db) = test_app_at(test_time()).await;

        let (_, body) = post(&app, "/api/sessions", json!({"userId": "u1"})).await;
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = post(
            &app,
            &format!("/api/sessions/{id}/pause"),
            json!({"userId": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "paused");

        let (status, body) = post(
            &app,
            &format!("/api/sessions/{id}/resume"),
            json!({"userId": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["welcomeBack"], true);
        assert_eq!(body["session"]["status"], "active");

        // Resuming again is an invalid transition.
        let (status, body) = post(
            &app,
            &format!("/api/sessions/{id}/resume"),
            json!({"userId": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Invalid transition");
    }

    #[tokio::test]
    async fn test_get_session_scoped_to_owner() {
        let (app, _db) = test_app_at(test_time()).await;
        let (_, body) = post(&app, "/api/sessions", json!({"userId": "u1"})).await;
        let id = body["id"].as_str().unwrap().to_string();

        let (status, _) = get(&app, &format!("/api/sessions/{id}?userId=u1")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(&app, &format!("/api/sessions/{id}?userId=u2")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_complete_all_idempotent_over_http() {
        let (app, _db) = test_app_at(test_time()).await;
        post(&app, "/api/sessions", json!({"userId": "u1"})).await;

        let (status, body) =
            post(&app, "/api/sessions/complete-all", json!({"userId": "u1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sessionsEnded"], 1);

        let (status, body) =
            post(&app, "/api/sessions/complete-all", json!({"userId": "u1"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sessionsEnded"], 0);
    }

    #[tokio::test]
    async fn test_classify_answer_seeking() {
        let (app, _db) = test_app_at(test_time()).await;
        let (status, body) = post(
            &app,
            "/api/classify",
            json!({"message": "just give me the answer to this exam question"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isAnswerSeeking"], true);
        assert_eq!(body["confidence"], "high");
        assert!(body["guardDirective"].as_str().unwrap().contains("Do not"));
    }

    #[tokio::test]
    async fn test_classify_learning_seeking() {
        let (app, _db) = test_app_at(test_time()).await;
        let (status, body) = post(
            &app,
            "/api/classify",
            json!({"message": "can you help me understand why this exam question works, I'm confused"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isAnswerSeeking"], false);
        assert!(body.get("guardDirective").is_none());
    }

    #[tokio::test]
    async fn test_proactive_none_for_paused_session() {
        let (app, _db) = test_app_at(test_time()).await;
        let (_, body) = post(&app, "/api/sessions", json!({"userId": "u1"})).await;
        let id = body["id"].as_str().unwrap().to_string();
        post(
            &app,
            &format!("/api/sessions/{id}/pause"),
            json!({"userId": "u1"}),
        )
        .await;

        let (status, body) = post(
            &app,
            &format!("/api/sessions/{id}/proactive"),
            json!({"userId": "u1", "aiMessagesSinceAsk": 10}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "none");
        assert_eq!(body["shouldAsk"], false);
    }

    #[tokio::test]
    async fn test_proactive_fails_open_for_unknown_session() {
        let (app, _db) = test_app_at(test_time()).await;
        let (status, body) = post(
            &app,
            "/api/sessions/not-a-session/proactive",
            json!({"userId": "u1"}),
        )
        .await;
        // Advisory layer: no 404, just the conservative output.
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "none");
        assert_eq!(body["shouldAsk"], false);
    }

    #[tokio::test]
    async fn test_proactive_start_phase_for_fresh_session() {
        let (app, _db) = test_app_at(test_time()).await;
        let (_, body) = post(&app, "/api/sessions", json!({"userId": "u1"})).await;
        let id = body["id"].as_str().unwrap().to_string();

        let (status, body) = post(
            &app,
            &format!("/api/sessions/{id}/proactive"),
            json!({"userId": "u1"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "start");
        assert_eq!(body["shouldAsk"], true);
        assert!(body["promptHint"].is_string());
    }

    #[tokio::test]
    async fn test_proactive_wrap_up_for_long_session() {
        // Create at T, poll 50 minutes later with the message counter past
        // the setup phase.
        let start = test_time();
        let db = Database::new_in_memory().await.expect("in-memory DB");
        let create_state = AppState::with_parts(
            db.clone(),
            std::sync::Arc::new(FixedClock(start)),
            Notifier::disabled(),
        );
        let create_app_router = create_app(create_state);
        let (_, body) = post(&create_app_router, "/api/sessions", json!({"userId": "u1"})).await;
        let id = body["id"].as_str().unwrap().to_string();

        let now = start + Duration::minutes(50);
        for i in 0..12 {
            let role = if i % 2 == 0 {
                study_partner_core::Role::User
            } else {
                study_partner_core::Role::Assistant
            };
            db.append_turn(&id, "u1", role, "working through practice problems", start.timestamp() + i)
                .await
                .unwrap();
        }

        let poll_state = AppState::with_parts(
            db,
            std::sync::Arc::new(FixedClock(now)),
            Notifier::disabled(),
        );
        let app = create_app(poll_state);
        let (status, body) = post(
            &app,
            &format!("/api/sessions/{id}/proactive"),
            json!({"userId": "u1", "lastAskIndex": 4, "aiMessagesSinceAsk": 5}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "wrap_up");
        assert_eq!(body["shouldAsk"], true);
    }
}
