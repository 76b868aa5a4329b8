use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use jobradar_db::FilterField;

use crate::auth::require_api_key;
use crate::dto::{
    CacheStatusDto, FilterOptionsResponse, HealthResponse, JobDto, JobsResponse, ListJobsQuery,
    RefreshResponse, StatsResponse, millis_to_datetime,
};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .route("/v1/refresh", post(force_refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let public = Router::new()
        .route("/health", get(health))
        .route("/v1/jobs", get(list_jobs))
        .route("/v1/cache", get(cache_status))
        .route("/v1/filters", get(filter_options))
        .route("/v1/stats", get(stats))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(admin).with_state(state)
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/jobs",
    params(ListJobsQuery),
    responses(
        (status = 200, description = "Aggregated job postings", body = JobsResponse),
    ),
    tag = "jobs"
)]
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListJobsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let force = query.refresh.unwrap_or(false);
    let served = state.service.fetch(force).await;

    let filters = query.filters();
    let jobs: Vec<JobDto> = served
        .jobs
        .into_iter()
        .filter(|job| filters.matches(job))
        .map(JobDto::from)
        .collect();

    let response = JobsResponse {
        total_count: jobs.len(),
        jobs,
        last_updated: millis_to_datetime(served.created_at),
        source: if served.from_cache { "cache" } else { "fresh" },
        cache_status: state.service.cache_status().await.into(),
        errors: served.errors.into_iter().map(Into::into).collect(),
    };

    Ok(axum::Json(response))
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/cache",
    responses(
        (status = 200, description = "Cache status", body = CacheStatusDto),
    ),
    tag = "system"
)]
pub async fn cache_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status: CacheStatusDto = state.service.cache_status().await.into();
    axum::Json(status)
}

// ---------------------------------------------------------------------------
// Forced refresh
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/refresh",
    responses(
        (status = 200, description = "Fresh aggregation run completed", body = RefreshResponse),
        (status = 401, description = "Unauthorized"),
    ),
    security(("bearer" = [])),
    tag = "system"
)]
pub async fn force_refresh(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.invalidate_cache().await?;
    let served = state.service.fetch(true).await;

    let response = RefreshResponse {
        total_count: served.jobs.len(),
        errors: served.errors.into_iter().map(Into::into).collect(),
        last_updated: millis_to_datetime(served.created_at),
    };

    Ok(axum::Json(response))
}

// ---------------------------------------------------------------------------
// Filter options & stats
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/v1/filters",
    responses(
        (status = 200, description = "Distinct filter values", body = FilterOptionsResponse),
    ),
    tag = "jobs"
)]
pub async fn filter_options(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.job_repo();
    let companies = repo.distinct_values(FilterField::Company).await?;
    let locations = repo.distinct_values(FilterField::Location).await?;

    Ok(axum::Json(FilterOptionsResponse {
        companies,
        locations,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/stats",
    responses(
        (status = 200, description = "Store statistics", body = StatsResponse),
    ),
    tag = "system"
)]
pub async fn stats(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let repo = state.db.job_repo();
    let stats = repo.stats().await?;
    let last_run = repo
        .latest_run()
        .await?
        .map(|run| serde_json::to_value(run))
        .transpose()
        .map_err(jobradar_core::AppError::from)?;

    Ok(axum::Json(StatsResponse {
        total_active: stats.total_active,
        by_company: stats
            .by_company
            .into_iter()
            .map(|c| crate::dto::CompanyCountDto {
                company_name: c.company_name,
                count: c.count,
            })
            .collect(),
        last_run,
    }))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let db_status = match state.db.job_repo().health_check().await {
        Ok(()) => "ok",
        Err(_) => "error",
    };

    let status = if db_status == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if db_status == "ok" {
            "healthy"
        } else {
            "unhealthy"
        },
        database: db_status,
    };

    (status, axum::Json(response))
}
