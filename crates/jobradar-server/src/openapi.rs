use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "JobRadar API",
        version = "0.2.0",
        description = "Aggregated, deduplicated job postings scraped from employer career sites."
    ),
    paths(
        crate::routes::list_jobs,
        crate::routes::cache_status,
        crate::routes::force_refresh,
        crate::routes::filter_options,
        crate::routes::stats,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::JobDto,
        crate::dto::JobsResponse,
        crate::dto::SourceErrorDto,
        crate::dto::CacheStatusDto,
        crate::dto::RefreshResponse,
        crate::dto::FilterOptionsResponse,
        crate::dto::StatsResponse,
        crate::dto::CompanyCountDto,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "jobs", description = "Aggregated job postings"),
        (name = "system", description = "Cache, refresh, and health"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds Bearer token security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "Admin API key. Set via JOBRADAR_API_KEY environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
