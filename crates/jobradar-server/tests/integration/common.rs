use std::sync::Arc;

use axum::Router;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use jobradar_core::testutil::{MockSource, make_job};
use jobradar_core::traits::JobSource;
use jobradar_core::{Aggregator, JobCache, RefreshService};
use jobradar_db::Database;
use jobradar_server::routes;
use jobradar_server::state::AppState;

pub const TEST_API_KEY: &str = "test-secret-key";

const MIGRATIONS: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS jobs (
        id VARCHAR PRIMARY KEY,
        company_name VARCHAR NOT NULL,
        job_title VARCHAR NOT NULL,
        location VARCHAR NOT NULL,
        publish_date DATE,
        url VARCHAR NOT NULL,
        source VARCHAR(50) NOT NULL,
        description TEXT,
        contract_type VARCHAR(50),
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        scraped_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
    r#"CREATE TABLE IF NOT EXISTS scrape_runs (
        id UUID PRIMARY KEY,
        started_at TIMESTAMPTZ NOT NULL,
        finished_at TIMESTAMPTZ NOT NULL,
        total_jobs INTEGER NOT NULL,
        source_errors JSONB NOT NULL DEFAULT '[]'::jsonb
    )"#,
];

/// A fully wired test application: router over a containerized Postgres,
/// a temp-dir cache, and mock sources instead of live scrapers.
pub struct TestApp {
    pub router: Router,
    _container: ContainerAsync<GenericImage>,
    _cache_dir: tempfile::TempDir,
}

/// Default mock registry: one healthy source, one failing source.
pub fn default_mock_sources() -> Vec<Arc<dyn JobSource>> {
    let tagged = |company: &str, title: &str, location: &str| {
        let mut job = make_job(company, title, location);
        job.source = "lyra".to_string();
        job
    };
    vec![
        Arc::new(MockSource::new("lyra").with_jobs(vec![
            tagged("Lyra Network", "Rust Developer", "Toulouse"),
            tagged("Lyra Network", "Ingénieur Réseau", "Paris"),
        ])),
        Arc::new(MockSource::new("estreem").with_error(
            jobradar_core::AppError::HttpError("HTTP 503 for estreem".into()),
        )),
    ]
}

pub async fn setup_test_app(sources: Vec<Arc<dyn JobSource>>) -> TestApp {
    let container = GenericImage::new("postgres", "16")
        .with_exposed_port(ContainerPort::Tcp(5432))
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "jobradar_test")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get port");

    let url = format!("postgresql://postgres:postgres@{host}:{port}/jobradar_test");
    let pool = retry_connect(&url).await;

    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(&pool)
            .await
            .expect("Failed to run migration");
    }

    let cache_dir = tempfile::tempdir().expect("Failed to create cache dir");
    let db = Database::from_pool(pool);
    let service = RefreshService::with_store(
        Aggregator::new(sources),
        JobCache::in_dir(cache_dir.path()),
        db.job_repo(),
    );

    let state = Arc::new(AppState {
        service,
        db,
        api_key: TEST_API_KEY.to_string(),
    });

    TestApp {
        router: routes::router(state),
        _container: container,
        _cache_dir: cache_dir,
    }
}

async fn retry_connect(url: &str) -> PgPool {
    for _ in 0..30 {
        if let Ok(pool) = PgPoolOptions::new().max_connections(5).connect(url).await {
            return pool;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    panic!("Failed to connect to test database");
}
