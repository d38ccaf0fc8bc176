//! API route handlers for the study-partner server.

pub mod classify;
pub mod health;
pub mod proactive;
pub mod sessions;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET  /api/health                    - Health check
/// - POST /api/sessions                  - Create a tutor session
/// - GET  /api/sessions/{id}             - Fetch one session
/// - POST /api/sessions/{id}/pause       - Pause an active session
/// - POST /api/sessions/{id}/resume      - Resume a paused session
/// - POST /api/sessions/{id}/complete    - Complete a session
/// - POST /api/sessions/complete-all     - End all open sessions for a user
/// - POST /api/sessions/{id}/proactive   - Proactive suggestion poll
/// - POST /api/classify                  - Homework-intent classification
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", sessions::router())
        .nest("/api", proactive::router())
        .nest("/api", classify::router())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_routes_creation() {
        let db = study_partner_db::Database::new_in_memory()
            .await
            .expect("in-memory DB");
        let state = AppState::new(db);
        let _router = api_routes(state);
    }
}
