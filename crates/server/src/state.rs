// crates/server/src/state.rs
//! Application state for the Axum server.

use crate::notify::Notifier;
use std::sync::Arc;
use std::time::Instant;
use study_partner_core::{Clock, SystemClock};
use study_partner_db::Database;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Database handle for session lifecycle and turn history.
    pub db: Database,
    /// Injectable wall clock; every handler takes `now` from here so
    /// elapsed-time behavior is deterministic under test.
    pub clock: Arc<dyn Clock>,
    /// Fire-and-forget session-start notifications.
    pub notifier: Notifier,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(db: Database) -> Arc<Self> {
        Self::with_parts(db, Arc::new(SystemClock), Notifier::disabled())
    }

    /// Create with an externally-provided clock and notifier (tests,
    /// configured deployments).
    pub fn with_parts(db: Database, clock: Arc<dyn Clock>, notifier: Notifier) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            clock,
            notifier,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_new() {
        let db = Database::new_in_memory().await.expect("in-memory DB");
        let state = AppState::new(db);
        assert!(state.uptime_secs() < 1);
    }
}
