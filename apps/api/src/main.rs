mod access;
mod admin;
mod auth;
mod candidates;
mod config;
mod db;
mod errors;
mod jobs;
mod models;
mod resumes;
mod routes;
mod scoring;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::{bootstrap_admin, SessionKeys};
use crate::config::Config;
use crate::db::create_pool;
use crate::resumes::extract::FileTextExtractor;
use crate::routes::build_router;
use crate::scoring::HttpResumeScorer;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting cvalign API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and apply migrations
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    let store = Arc::new(PgStore::new(db));

    if let Some(admin) = &config.bootstrap_admin {
        bootstrap_admin(store.as_ref(), admin).await?;
    }

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    info!("Upload directory: {}", config.upload_dir.display());

    let scorer = HttpResumeScorer::new(
        config.scoring_url.clone(),
        Duration::from_secs(config.scoring_timeout_secs),
    )?;
    info!(
        "Scoring client initialized ({}, timeout {}s)",
        config.scoring_url, config.scoring_timeout_secs
    );

    // Build app state
    let state = AppState {
        store,
        sessions: SessionKeys::new(config.jwt_secret.as_bytes(), config.session_ttl_secs),
        scorer: Arc::new(scorer),
        extractor: Arc::new(FileTextExtractor),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the SPA host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
