//! Bouwdepot Tracker API — entry point.
//!
//! Stores construction depots and their invoices in SQLite and serves the
//! derived ledger views (remaining budget, utilisation, expiry urgency) over
//! a small Axum REST API. Callers are identified by the upstream gateway.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod models;

#[cfg(test)]
mod test_api;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Load config from environment.
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url, config.max_connections).await?;

    // ─── REST API ─────────────────────────────────────────
    let api_state = Arc::new(api::ApiState::new(pool, config.login_url.clone()));
    let app = api::router(api_state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

