use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use jobradar_core::identity::compute_id;
use jobradar_core::models::NormalizedJob;

/// SQL migration statements, executed one at a time.
const MIGRATIONS: &[&str] = &[
    // 001_jobs.sql
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
    r#"CREATE INDEX IF NOT EXISTS idx_jobs_source_active
        ON jobs(source) WHERE is_active"#,
    r#"CREATE INDEX IF NOT EXISTS idx_jobs_company_active
        ON jobs(company_name) WHERE is_active"#,
    // 002_scrape_runs.sql
    r#"CREATE TABLE IF NOT EXISTS scrape_runs (
        id UUID PRIMARY KEY,
        started_at TIMESTAMPTZ NOT NULL,
        finished_at TIMESTAMPTZ NOT NULL,
        total_jobs INTEGER NOT NULL,
        source_errors JSONB NOT NULL DEFAULT '[]'::jsonb
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_scrape_runs_finished
        ON scrape_runs(finished_at DESC)"#,
];

/// Spins up a PostgreSQL container and returns a connected pool.
///
/// The `ContainerAsync` must be kept in scope for the test duration —
/// dropping it will stop the container.
pub async fn setup_test_db() -> (PgPool, ContainerAsync<GenericImage>) {
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

    let connection_string = format!("postgresql://postgres:postgres@{host}:{port}/jobradar_test");

    // Retry connection until container is fully ready
    const MAX_RETRIES: u32 = 30;
    let mut retries = 0;
    let pool = loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .connect(&connection_string)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retries += 1;
                if retries >= MAX_RETRIES {
                    panic!("Failed to connect to database after {MAX_RETRIES} retries: {e}");
                }
                tokio::time::sleep(std::time::Duration::from_millis(100)).await;
            }
        }
    };

    // Run migrations one statement at a time
    for migration in MIGRATIONS {
        sqlx::query(migration)
            .execute(&pool)
            .await
            .expect("Migration failed");
    }

    (pool, container)
}

/// Build a normalized job for a given source with a properly derived id.
pub fn fixture_job(source: &str, company: &str, title: &str, location: &str) -> NormalizedJob {
    NormalizedJob {
        id: compute_id(company, title, location, None),
        company_name: company.to_string(),
        job_title: title.to_string(),
        location: location.to_string(),
        publish_date: None,
        url: format!("https://careers.example.com/{source}"),
        source: source.to_string(),
        description: None,
        contract_type: None,
        degraded: false,
    }
}
