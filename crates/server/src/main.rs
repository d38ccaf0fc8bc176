// crates/server/src/main.rs
//! Study-partner server binary.
//!
//! Opens (or creates) the SQLite database, starts the Axum HTTP server,
//! and spawns the background expiry sweep for abandoned sessions.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use study_partner_core::SystemClock;
use study_partner_db::Database;
use study_partner_server::{create_app, spawn_expiry_sweep, AppState, Notifier};

#[derive(Debug, Parser)]
#[command(name = "study-partner", version, about = "AI study-partner session engine")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "STUDY_PARTNER_PORT", default_value_t = 4820)]
    port: u16,

    /// Database file path. Defaults to the per-user data directory.
    #[arg(long, env = "STUDY_PARTNER_DB")]
    db_path: Option<PathBuf>,

    /// Webhook URL for fire-and-forget session-start notifications.
    #[arg(long, env = "STUDY_PARTNER_NOTIFY_URL")]
    notify_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();

    let db = match &args.db_path {
        Some(path) => Database::new(path).await?,
        None => Database::open_default().await?,
    };
    tracing::info!(db_path = %db.db_path().display(), "Database ready");

    let state = AppState::with_parts(
        db,
        Arc::new(SystemClock),
        Notifier::new(args.notify_url.clone()),
    );

    spawn_expiry_sweep(state.clone());

    let app = create_app(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        version = env!("CARGO_PKG_VERSION"),
        "study-partner listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
