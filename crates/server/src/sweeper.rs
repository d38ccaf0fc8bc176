// crates/server/src/sweeper.rs
//! Background EXPIRED sweep.
//!
//! A singleton scheduled task, not per-request work: every interval it
//! moves idle ACTIVE sessions to EXPIRED through the same conditional
//! transition guard as user-initiated completion, so whichever side
//! lands first wins and the other no-ops.

use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often the sweep runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// A session with no activity for this long is considered abandoned.
pub const STALE_AFTER_SECS: i64 = 6 * 60 * 60;

/// Spawn the sweep loop. Failures are logged and the loop continues;
/// an unreachable database on one tick is not fatal.
pub fn spawn_expiry_sweep(state: Arc<AppState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            run_sweep_once(&state).await;
        }
    })
}

async fn run_sweep_once(state: &AppState) {
    let now_ts = state.clock.now_ts();
    match state.db.expire_stale(STALE_AFTER_SECS, now_ts).await {
        Ok(0) => tracing::debug!("Expiry sweep: nothing stale"),
        Ok(n) => tracing::info!(expired = n, "Expiry sweep: sessions expired"),
        Err(e) => tracing::warn!(error = %e, "Expiry sweep failed (non-fatal)"),
    }
}
