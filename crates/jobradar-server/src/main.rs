use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobradar_core::{Aggregator, JobCache, RefreshService};
use jobradar_db::{Database, DatabaseConfig};
use jobradar_server::routes;
use jobradar_server::state::AppState;
use jobradar_sources::{ReqwestFetcher, default_sources};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobradar=info".parse()?))
        .with_target(false)
        .init();

    let api_key = std::env::var("JOBRADAR_API_KEY").expect("JOBRADAR_API_KEY must be set");
    let port = std::env::var("JOBRADAR_PORT").unwrap_or_else(|_| "3000".to_string());
    let cache_dir = std::env::var("JOBRADAR_CACHE_DIR").unwrap_or_else(|_| "cache".to_string());
    let run_timeout: u64 = std::env::var("JOBRADAR_RUN_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(120);
    let addr = format!("0.0.0.0:{port}");

    let db = Database::connect(&DatabaseConfig::from_env()?).await?;
    db.migrate().await?;

    let fetcher = ReqwestFetcher::new()?;
    let aggregator = Aggregator::new(default_sources(&fetcher))
        .with_timeout(Duration::from_secs(run_timeout));
    let cache = JobCache::in_dir(&cache_dir);
    let service = RefreshService::with_store(aggregator, cache, db.job_repo());

    let state = Arc::new(AppState {
        service,
        db,
        api_key,
    });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!("Starting server on {addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    tracing::info!("Shutdown signal received");
}
