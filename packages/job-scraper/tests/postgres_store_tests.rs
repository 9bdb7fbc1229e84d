//! PostgresStore against a real database.
//!
//! Needs Docker: cargo test --test postgres_store_tests -- --ignored

mod common;

use chrono::{Duration, Utc};

use common::TestHarness;
use job_scraper::testing::CandidateBuilder;
use job_scraper::{
    Certification, JobFilter, JobReader, JobSource, JobWriter, SourceLocker, StoreError,
};

#[tokio::test]
#[ignore = "requires Docker"]
async fn create_round_trips_and_rejects_duplicate_urls() {
    let harness = TestHarness::new().await.unwrap();
    let store = &harness.store;
    let job = CandidateBuilder::new("Peer Specialist", "Acme Health")
        .salary("$20 - $25")
        .certifications(vec![Certification::Crpa, Certification::Cps])
        .build()
        .validate()
        .unwrap();

    let created = store.create(&job).await.unwrap();
    assert!(created.is_active);
    assert_eq!(created.scraped_at, created.updated_at);

    let fetched = store.find_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, "Peer Specialist");
    assert_eq!(fetched.salary.as_deref(), Some("$20 - $25"));
    assert_eq!(
        fetched.certifications_req,
        vec![Certification::Crpa, Certification::Cps]
    );

    let err = store.create(&job).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn same_url_on_another_source_is_allowed() {
    let harness = TestHarness::new().await.unwrap();
    let store = &harness.store;
    let url = "https://example.org/jobs/peer-1";

    let indeed = CandidateBuilder::new("Peer Specialist", "Acme").url(url).build();
    let linkedin = CandidateBuilder::new("Peer Specialist", "Acme")
        .url(url)
        .source(JobSource::LinkedIn)
        .build();

    store.create(&indeed.validate().unwrap()).await.unwrap();
    store.create(&linkedin.validate().unwrap()).await.unwrap();

    assert_eq!(store.find_active_by_source(JobSource::Indeed).await.unwrap().len(), 1);
    assert_eq!(store.find_active_by_source(JobSource::LinkedIn).await.unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn archive_deactivates_only_old_postings_once() {
    let harness = TestHarness::new().await.unwrap();
    let store = &harness.store;

    let old = store
        .create(
            &CandidateBuilder::new("Peer Advocate", "Old Org")
                .build()
                .validate()
                .unwrap(),
        )
        .await
        .unwrap();
    sqlx::query("UPDATE jobs SET scraped_at = $1 WHERE id = $2")
        .bind(Utc::now() - Duration::days(120))
        .bind(old.id)
        .execute(harness.pool())
        .await
        .unwrap();
    store
        .create(
            &CandidateBuilder::new("Peer Advocate", "New Org")
                .build()
                .validate()
                .unwrap(),
        )
        .await
        .unwrap();

    let cutoff = Utc::now() - Duration::days(90);
    assert_eq!(store.archive_older_than(cutoff).await.unwrap(), 1);
    assert_eq!(store.archive_older_than(cutoff).await.unwrap(), 0);

    let archived = store.find_by_id(old.id).await.unwrap().unwrap();
    assert!(!archived.is_active);
    assert!(archived.updated_at > archived.scraped_at);

    let active = store.find_active_by_source(JobSource::Indeed).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].company, "New Org");
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn archived_url_can_be_created_again() {
    let harness = TestHarness::new().await.unwrap();
    let store = &harness.store;
    let job = CandidateBuilder::new("Peer Specialist", "Acme Health")
        .url("https://www.indeed.com/viewjob?jk=relisted")
        .build()
        .validate()
        .unwrap();

    let first = store.create(&job).await.unwrap();
    sqlx::query("UPDATE jobs SET scraped_at = $1 WHERE id = $2")
        .bind(Utc::now() - Duration::days(120))
        .bind(first.id)
        .execute(harness.pool())
        .await
        .unwrap();
    assert_eq!(
        store
            .archive_older_than(Utc::now() - Duration::days(90))
            .await
            .unwrap(),
        1
    );

    let relisted = store.create(&job).await.unwrap();
    assert_ne!(relisted.id, first.id);
    assert!(relisted.is_active);

    let err = store.create(&job).await.unwrap_err();
    assert!(matches!(err, StoreError::DuplicateKey { .. }));

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_jobs, 2);
    assert_eq!(stats.active_jobs, 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn list_active_filters_and_pages() {
    let harness = TestHarness::new().await.unwrap();
    let store = &harness.store;

    for (title, company, location) in [
        ("Peer Specialist", "Acme", "Bronx, NY"),
        ("Peer Advocate", "Harlem House", "Manhattan, NY"),
        ("Recovery Coach", "Bronx Works", "Bronx, NY"),
    ] {
        let job = CandidateBuilder::new(title, company)
            .location(location)
            .build()
            .validate()
            .unwrap();
        store.create(&job).await.unwrap();
    }

    let bronx = store
        .list_active(&JobFilter {
            location: Some("bronx".to_string()),
            ..JobFilter::new()
        })
        .await
        .unwrap();
    assert_eq!(bronx.total, 2);

    let search = store
        .list_active(&JobFilter::new().with_search("advocate"))
        .await
        .unwrap();
    assert_eq!(search.total, 1);
    assert_eq!(search.items[0].company, "Harlem House");

    let paged = store
        .list_active(&JobFilter::new().with_page(2, 2))
        .await
        .unwrap();
    assert_eq!(paged.total, 3);
    assert_eq!(paged.items.len(), 1);
    assert_eq!(paged.total_pages(), 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn stats_count_active_jobs_by_source() {
    let harness = TestHarness::new().await.unwrap();
    let store = &harness.store;

    store
        .create(&CandidateBuilder::new("Peer Specialist", "A").build().validate().unwrap())
        .await
        .unwrap();
    store
        .create(
            &CandidateBuilder::new("Peer Specialist", "B")
                .source(JobSource::LinkedIn)
                .url("https://www.linkedin.com/jobs/view/1")
                .build()
                .validate()
                .unwrap(),
        )
        .await
        .unwrap();

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_jobs, 2);
    assert_eq!(stats.active_jobs, 2);
    assert_eq!(
        stats
            .jobs_by_source
            .iter()
            .map(|entry| (entry.source, entry.count))
            .collect::<Vec<_>>(),
        vec![(JobSource::Indeed, 1), (JobSource::LinkedIn, 1)]
    );
    assert_eq!(stats.recent_jobs.len(), 2);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn source_lock_is_exclusive_across_connections() {
    let harness = TestHarness::new().await.unwrap();
    let store = &harness.store;

    let held = store.lock_source(JobSource::Indeed).await.unwrap();
    assert!(held.is_some());
    assert!(store.lock_source(JobSource::Indeed).await.unwrap().is_none());
    assert!(store.lock_source(JobSource::LinkedIn).await.unwrap().is_some());

    drop(held);
    // The transaction rolls back when its connection is returned to the pool.
    let mut reacquired = None;
    for _ in 0..20 {
        reacquired = store.lock_source(JobSource::Indeed).await.unwrap();
        if reacquired.is_some() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert!(reacquired.is_some());
}
