use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use jobradar_core::error::AppError;
use jobradar_core::models::{
    JobFilters, NewScrapeRun, NormalizedJob, ReconcileSummary, StoredJobRecord,
};

/// Columns the inbound query interface can enumerate distinct values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Company,
    Location,
}

impl FilterField {
    fn column(self) -> &'static str {
        match self {
            FilterField::Company => "company_name",
            FilterField::Location => "location",
        }
    }
}

/// Active-job totals, per company, for the status dashboard.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub total_active: i64,
    pub by_company: Vec<CompanyCount>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CompanyCount {
    pub company_name: String,
    pub count: i64,
}

/// PostgreSQL-backed job store with the soft-delete lifecycle.
#[derive(Clone)]
pub struct JobRepository {
    pool: Pool<Postgres>,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert the fresh records for one source, then retire everything of
    /// that source whose id did not appear.
    ///
    /// Runs in a single transaction holding a per-source advisory lock, so
    /// two concurrent reconciles of the same source serialize instead of
    /// interleaving their active/inactive updates. Different sources do
    /// not contend.
    pub async fn reconcile(
        &self,
        source: &str,
        fresh: &[NormalizedJob],
    ) -> Result<ReconcileSummary, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(source)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let existing: Vec<String> = sqlx::query_scalar("SELECT id FROM jobs WHERE source = $1")
            .bind(source)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        let existing: HashSet<String> = existing.into_iter().collect();

        let mut summary = ReconcileSummary::default();
        for job in fresh {
            sqlx::query(
                r#"
                INSERT INTO jobs (id, company_name, job_title, location, publish_date,
                                  url, source, description, contract_type, is_active, scraped_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, NOW())
                ON CONFLICT (id) DO UPDATE SET
                    company_name = EXCLUDED.company_name,
                    job_title = EXCLUDED.job_title,
                    location = EXCLUDED.location,
                    publish_date = EXCLUDED.publish_date,
                    url = EXCLUDED.url,
                    source = EXCLUDED.source,
                    description = EXCLUDED.description,
                    contract_type = EXCLUDED.contract_type,
                    is_active = TRUE,
                    scraped_at = NOW()
                "#,
            )
            .bind(&job.id)
            .bind(&job.company_name)
            .bind(&job.job_title)
            .bind(&job.location)
            .bind(job.publish_date)
            .bind(&job.url)
            .bind(&job.source)
            .bind(&job.description)
            .bind(&job.contract_type)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

            if existing.contains(&job.id) {
                summary.updated += 1;
            } else {
                summary.created += 1;
            }
        }

        let fresh_ids: Vec<String> = fresh.iter().map(|j| j.id.clone()).collect();
        let deactivated = sqlx::query(
            r#"
            UPDATE jobs
            SET is_active = FALSE
            WHERE source = $1 AND is_active AND NOT (id = ANY($2))
            "#,
        )
        .bind(source)
        .bind(&fresh_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        summary.deactivated = deactivated.rows_affected();

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        tracing::debug!(
            source,
            created = summary.created,
            updated = summary.updated,
            deactivated = summary.deactivated,
            "Reconcile committed"
        );
        Ok(summary)
    }

    /// Active records matching the given filters.
    pub async fn query(&self, filters: &JobFilters) -> Result<Vec<StoredJobRecord>, AppError> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT id, company_name, job_title, location, publish_date, url, source,
                   description, contract_type, is_active, scraped_at, created_at
            FROM jobs
            WHERE is_active
              AND (cardinality($1::varchar[]) = 0 OR company_name = ANY($1))
              AND (cardinality($2::varchar[]) = 0 OR location = ANY($2))
              AND ($3::varchar IS NULL
                   OR company_name ILIKE '%' || $3 || '%'
                   OR job_title ILIKE '%' || $3 || '%'
                   OR location ILIKE '%' || $3 || '%'
                   OR COALESCE(description, '') ILIKE '%' || $3 || '%')
            ORDER BY company_name ASC, publish_date DESC NULLS LAST, job_title ASC
            "#,
        )
        .bind(&filters.companies)
        .bind(&filters.locations)
        .bind(&filters.search)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Distinct values of a filterable column among active records, sorted,
    /// for building filter option lists.
    pub async fn distinct_values(&self, field: FilterField) -> Result<Vec<String>, AppError> {
        let sql = format!(
            "SELECT DISTINCT {col} FROM jobs WHERE is_active ORDER BY {col} ASC",
            col = field.column()
        );
        sqlx::query_scalar(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))
    }

    /// Active-job totals per company.
    pub async fn stats(&self) -> Result<StoreStats, AppError> {
        let by_company: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT company_name, COUNT(*) AS count
            FROM jobs
            WHERE is_active
            GROUP BY company_name
            ORDER BY count DESC, company_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        let total_active = by_company.iter().map(|(_, c)| c).sum();

        Ok(StoreStats {
            total_active,
            by_company: by_company
                .into_iter()
                .map(|(company_name, count)| CompanyCount {
                    company_name,
                    count,
                })
                .collect(),
        })
    }

    /// Write one completed aggregation run to the log.
    pub async fn record_run(&self, run: &NewScrapeRun) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO scrape_runs (id, started_at, finished_at, total_jobs, source_errors)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(run.id)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.total_jobs as i32)
        .bind(serde_json::to_value(&run.errors)?)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    /// The most recent run log entry, if any.
    pub async fn latest_run(&self) -> Result<Option<ScrapeRunRecord>, AppError> {
        let row = sqlx::query_as::<_, ScrapeRunRow>(
            r#"
            SELECT id, started_at, finished_at, total_jobs, source_errors
            FROM scrape_runs
            ORDER BY finished_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

// -- Internal row types for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    company_name: String,
    job_title: String,
    location: String,
    publish_date: Option<NaiveDate>,
    url: String,
    source: String,
    description: Option<String>,
    contract_type: Option<String>,
    is_active: bool,
    scraped_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<JobRow> for StoredJobRecord {
    fn from(row: JobRow) -> Self {
        StoredJobRecord {
            id: row.id,
            company_name: row.company_name,
            job_title: row.job_title,
            location: row.location,
            publish_date: row.publish_date,
            url: row.url,
            source: row.source,
            description: row.description,
            contract_type: row.contract_type,
            is_active: row.is_active,
            scraped_at: row.scraped_at,
            created_at: row.created_at,
        }
    }
}

/// One persisted run log entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScrapeRunRecord {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_jobs: i32,
    pub source_errors: serde_json::Value,
}

#[derive(sqlx::FromRow)]
struct ScrapeRunRow {
    id: Uuid,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    total_jobs: i32,
    source_errors: serde_json::Value,
}

impl From<ScrapeRunRow> for ScrapeRunRecord {
    fn from(row: ScrapeRunRow) -> Self {
        ScrapeRunRecord {
            id: row.id,
            started_at: row.started_at,
            finished_at: row.finished_at,
            total_jobs: row.total_jobs,
            source_errors: row.source_errors,
        }
    }
}

// -- Trait implementation --

impl jobradar_core::traits::JobStore for JobRepository {
    async fn reconcile(
        &self,
        source: &str,
        fresh: &[NormalizedJob],
    ) -> Result<ReconcileSummary, AppError> {
        JobRepository::reconcile(self, source, fresh).await
    }

    async fn record_run(&self, run: &NewScrapeRun) -> Result<(), AppError> {
        JobRepository::record_run(self, run).await
    }
}
