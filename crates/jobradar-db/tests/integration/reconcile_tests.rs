use chrono::NaiveDate;
use jobradar_core::identity::compute_id;
use jobradar_core::models::JobFilters;
use jobradar_db::{FilterField, JobRepository};

use crate::integration::common::{fixture_job, setup_test_db};

#[tokio::test]
async fn first_sight_creates_active_records() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    let fresh = vec![
        fixture_job("lyra", "Lyra Network", "Rust Developer", "Toulouse"),
        fixture_job("lyra", "Lyra Network", "DevOps Engineer", "Toulouse"),
    ];

    let summary = repo.reconcile("lyra", &fresh).await.unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.deactivated, 0);

    let stored = repo.query(&JobFilters::default()).await.unwrap();
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|r| r.is_active));
}

#[tokio::test]
async fn second_identical_run_only_updates() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    let fresh = vec![fixture_job(
        "infomil",
        "Infomil",
        "Consultant fonctionnel H/F",
        "Toulouse (31)",
    )];

    repo.reconcile("infomil", &fresh).await.unwrap();
    let summary = repo.reconcile("infomil", &fresh).await.unwrap();

    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.deactivated, 0);
}

#[tokio::test]
async fn vanished_posting_is_deactivated_not_deleted() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool.clone());

    let kept = fixture_job("lyra", "Lyra Network", "Rust Developer", "Toulouse");
    let vanished = fixture_job("lyra", "Lyra Network", "DevOps Engineer", "Toulouse");
    let added = fixture_job("lyra", "Lyra Network", "Data Engineer", "Lyon");

    repo.reconcile("lyra", &[kept.clone(), vanished.clone()])
        .await
        .unwrap();

    let summary = repo
        .reconcile("lyra", &[kept.clone(), added.clone()])
        .await
        .unwrap();
    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);
    assert_eq!(summary.deactivated, 1);

    // Active queries no longer see the vanished posting...
    let active = repo.query(&JobFilters::default()).await.unwrap();
    let active_ids: Vec<_> = active.iter().map(|r| r.id.as_str()).collect();
    assert!(active_ids.contains(&kept.id.as_str()));
    assert!(active_ids.contains(&added.id.as_str()));
    assert!(!active_ids.contains(&vanished.id.as_str()));

    // ...but the row physically survives, inactive.
    let (is_active,): (bool,) = sqlx::query_as("SELECT is_active FROM jobs WHERE id = $1")
        .bind(&vanished.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert!(!is_active);
}

#[tokio::test]
async fn reconcile_is_scoped_per_source() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    let lyra_job = fixture_job("lyra", "Lyra Network", "Rust Developer", "Toulouse");
    let bpce_job = fixture_job("bpce", "BPCE", "Data Analyst", "Paris");

    repo.reconcile("lyra", &[lyra_job.clone()]).await.unwrap();
    repo.reconcile("bpce", &[bpce_job.clone()]).await.unwrap();

    // Refreshing lyra with an empty set must not touch bpce's records.
    let summary = repo.reconcile("lyra", &[]).await.unwrap();
    assert_eq!(summary.deactivated, 1);

    let active = repo.query(&JobFilters::default()).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, bpce_job.id);
}

#[tokio::test]
async fn reappearing_posting_reactivates() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    let job = fixture_job("estreem", "Estreem", "Manager CICD (H/F)", "Paris");

    repo.reconcile("estreem", &[job.clone()]).await.unwrap();
    repo.reconcile("estreem", &[]).await.unwrap();

    let summary = repo.reconcile("estreem", &[job.clone()]).await.unwrap();
    // The id already exists, so the reappearance is an update, not a create.
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 1);

    let active = repo.query(&JobFilters::default()).await.unwrap();
    assert_eq!(active.len(), 1);
    assert!(active[0].is_active);
}

#[tokio::test]
async fn repost_with_new_date_is_a_distinct_record() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    let mut original = fixture_job("infomil", "Infomil", "Consultant fonctionnel H/F", "Toulouse");
    original.publish_date = NaiveDate::from_ymd_opt(2025, 1, 10);
    original.id = compute_id(
        "Infomil",
        "Consultant fonctionnel H/F",
        "Toulouse",
        original.publish_date,
    );

    let mut repost = original.clone();
    repost.publish_date = NaiveDate::from_ymd_opt(2025, 3, 2);
    repost.id = compute_id(
        "Infomil",
        "Consultant fonctionnel H/F",
        "Toulouse",
        repost.publish_date,
    );

    repo.reconcile("infomil", &[original.clone()]).await.unwrap();
    let summary = repo
        .reconcile("infomil", &[original, repost])
        .await
        .unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.updated, 1);

    let active = repo.query(&JobFilters::default()).await.unwrap();
    assert_eq!(active.len(), 2);
}

#[tokio::test]
async fn query_filters_and_distinct_values() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    repo.reconcile(
        "lyra",
        &[
            fixture_job("lyra", "Lyra Network", "Rust Developer", "Toulouse"),
            fixture_job("lyra", "Lyra Network", "Ingénieur Réseau", "Paris"),
        ],
    )
    .await
    .unwrap();
    repo.reconcile(
        "bpce",
        &[fixture_job("bpce", "BPCE", "Data Analyst", "Paris")],
    )
    .await
    .unwrap();

    let by_company = repo
        .query(&JobFilters {
            companies: vec!["BPCE".into()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_company.len(), 1);
    assert_eq!(by_company[0].company_name, "BPCE");

    let by_location = repo
        .query(&JobFilters {
            locations: vec!["Paris".into()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_location.len(), 2);

    let by_search = repo
        .query(&JobFilters {
            search: Some("réseau".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_search.len(), 1);
    assert_eq!(by_search[0].job_title, "Ingénieur Réseau");

    let companies = repo.distinct_values(FilterField::Company).await.unwrap();
    assert_eq!(companies, vec!["BPCE".to_string(), "Lyra Network".to_string()]);

    let locations = repo.distinct_values(FilterField::Location).await.unwrap();
    assert_eq!(locations, vec!["Paris".to_string(), "Toulouse".to_string()]);

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.total_active, 3);
    assert_eq!(stats.by_company[0].company_name, "Lyra Network");
    assert_eq!(stats.by_company[0].count, 2);
}
