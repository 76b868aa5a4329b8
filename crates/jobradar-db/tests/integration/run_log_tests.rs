use chrono::Utc;
use uuid::Uuid;

use jobradar_core::models::{NewScrapeRun, SourceError};
use jobradar_db::JobRepository;

use crate::integration::common::setup_test_db;

#[tokio::test]
async fn records_and_reads_back_latest_run() {
    let (pool, _container) = setup_test_db().await;
    let repo = JobRepository::new(pool);

    assert!(repo.latest_run().await.unwrap().is_none());

    let first = NewScrapeRun {
        id: Uuid::new_v4(),
        started_at: Utc::now() - chrono::TimeDelta::minutes(10),
        finished_at: Utc::now() - chrono::TimeDelta::minutes(9),
        total_jobs: 12,
        errors: vec![],
    };
    repo.record_run(&first).await.unwrap();

    let second = NewScrapeRun {
        id: Uuid::new_v4(),
        started_at: Utc::now() - chrono::TimeDelta::minutes(1),
        finished_at: Utc::now(),
        total_jobs: 9,
        errors: vec![SourceError {
            source: "estreem".into(),
            message: "HTTP 503 for estreem".into(),
            endpoint: "https://partecis.teamtailor.com/jobs".into(),
        }],
    };
    repo.record_run(&second).await.unwrap();

    let latest = repo.latest_run().await.unwrap().expect("run should exist");
    assert_eq!(latest.id, second.id);
    assert_eq!(latest.total_jobs, 9);
    assert_eq!(latest.source_errors[0]["source"], "estreem");
}
