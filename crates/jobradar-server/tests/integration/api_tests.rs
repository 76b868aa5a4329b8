use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use crate::integration::common::{TEST_API_KEY, default_mock_sources, setup_test_app};

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app(default_mock_sources()).await;

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["database"], "ok");
}

#[tokio::test]
async fn jobs_returns_partial_success_with_errors() {
    let app = setup_test_app(default_mock_sources()).await;

    let response = app
        .router
        .oneshot(Request::get("/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["source"], "fresh");
    assert_eq!(json["total_count"], 2);
    assert_eq!(json["jobs"].as_array().unwrap().len(), 2);
    // The failing source is reported, not swallowed.
    assert_eq!(json["errors"].as_array().unwrap().len(), 1);
    assert_eq!(json["errors"][0]["source"], "estreem");
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let app = setup_test_app(default_mock_sources()).await;

    let first = app
        .router
        .clone()
        .oneshot(Request::get("/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(first).await["source"], "fresh");

    let second = app
        .router
        .oneshot(Request::get("/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(second).await;
    assert_eq!(json["source"], "cache");
    assert_eq!(json["cache_status"]["cached"], true);
}

#[tokio::test]
async fn filters_narrow_the_result() {
    let app = setup_test_app(default_mock_sources()).await;

    let response = app
        .router
        .oneshot(
            Request::get("/v1/jobs?search=r%C3%A9seau&locations=Paris")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["total_count"], 1);
    assert_eq!(json["jobs"][0]["job_title"], "Ingénieur Réseau");
}

#[tokio::test]
async fn refresh_requires_api_key() {
    let app = setup_test_app(default_mock_sources()).await;

    let unauthenticated = app
        .router
        .clone()
        .oneshot(Request::post("/v1/refresh").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(unauthenticated.status(), StatusCode::UNAUTHORIZED);

    let wrong_key = app
        .router
        .clone()
        .oneshot(
            Request::post("/v1/refresh")
                .header("authorization", "Bearer wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(wrong_key.status(), StatusCode::UNAUTHORIZED);

    let authenticated = app
        .router
        .oneshot(
            Request::post("/v1/refresh")
                .header("authorization", format!("Bearer {TEST_API_KEY}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(authenticated.status(), StatusCode::OK);

    let json = body_json(authenticated).await;
    assert_eq!(json["total_count"], 2);
}

#[tokio::test]
async fn jobs_run_populates_store_and_filter_options() {
    let app = setup_test_app(default_mock_sources()).await;

    // A fresh run reconciles the healthy source into the store.
    app.router
        .clone()
        .oneshot(Request::get("/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let filters = app
        .router
        .clone()
        .oneshot(Request::get("/v1/filters").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(filters).await;
    assert_eq!(json["companies"], serde_json::json!(["Lyra Network"]));
    assert_eq!(json["locations"], serde_json::json!(["Paris", "Toulouse"]));

    let stats = app
        .router
        .oneshot(Request::get("/v1/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(stats).await;
    assert_eq!(json["total_active"], 2);
    assert_eq!(json["by_company"][0]["company_name"], "Lyra Network");
    assert!(json["last_run"].is_object());
}

#[tokio::test]
async fn cache_endpoint_reports_state() {
    let app = setup_test_app(default_mock_sources()).await;

    let empty = app
        .router
        .clone()
        .oneshot(Request::get("/v1/cache").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(empty).await["cached"], false);

    app.router
        .clone()
        .oneshot(Request::get("/v1/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let populated = app
        .router
        .oneshot(Request::get("/v1/cache").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(populated).await;
    assert_eq!(json["cached"], true);
    assert_eq!(json["job_count"], 2);
}
