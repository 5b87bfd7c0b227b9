//! Invitation server — entry point.
//!
//! Starts the background tracker that drains click records into SQLite and
//! serves the invitation pages over Axum.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use invite_server::config::Config;
use invite_server::tracker::{self, TrackerState};
use invite_server::{db, fetch, router, ApiState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let pool = db::init_pool(&config.database_url).await?;
    let client = fetch::build_client(config.fetch_timeout_secs)?;

    // ─── Background tracker ───────────────────────────────
    let (sink, rx) = tracker::channel();
    let tracker_state = Arc::new(TrackerState {
        pool: pool.clone(),
        cap: config.tracking_cap,
    });
    tokio::spawn(tracker::run(tracker_state, rx));

    // ─── HTTP ─────────────────────────────────────────────
    let addr = format!("0.0.0.0:{}", config.api_port);
    info!(
        "Serving invitations from {} on http://{addr}",
        config.config_base_url
    );

    let app = router(Arc::new(ApiState {
        pool,
        client,
        config,
        sink,
    }));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
