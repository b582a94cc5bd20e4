//! Integration tests against a live PostgreSQL instance with the pgvector
//! extension available.
//!
//! Set `DATABASE_URL` to a database whose role may create extensions, then:
//!
//! ```bash
//! cargo test -- --ignored
//! ```

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use codevault_core::config::DatabaseConfig;
use codevault_core::database::{migrations, ConnectionManager, DatabaseHealthChecker};
use codevault_core::error::CodevaultError;
use codevault_core::models::{
    Document, Embedding, Job, JobStatus, JobType, NewDocument, NewJob, NewRepository,
    NewVectorDocument, Repository, RepositoryStatus, VectorDocument,
};

fn manager_from_env() -> Arc<ConnectionManager> {
    Arc::new(ConnectionManager::from_env().expect("DATABASE_URL must be set"))
}

fn unique_repo_url(label: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("https://github.com/codevault-tests/{label}-{nanos}")
}

#[tokio::test]
#[ignore] // Requires PostgreSQL with pgvector
async fn test_full_storage_lifecycle() {
    let manager = manager_from_env();
    let pool = manager.engine().await.expect("pool");
    migrations::run_all(&pool).await.expect("migrations");

    // Repository
    let new_repo = NewRepository::new("lifecycle", unique_repo_url("lifecycle"))
        .expect("valid url")
        .with_description("integration test repository");
    let repo = Repository::create(&pool, &new_repo).await.expect("create");
    assert_eq!(repo.status, RepositoryStatus::Pending);
    assert_eq!(repo.branch, "main");

    let repo = Repository::update_status(&pool, repo.id, RepositoryStatus::Processing)
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(repo.status, RepositoryStatus::Processing);
    assert!(repo.updated_at >= repo.created_at);

    // Document
    let new_doc = NewDocument::new("README", "Integration test content.", repo.id)
        .expect("valid content")
        .with_file_path("README.md")
        .with_file_type("markdown");
    let doc = Document::create(&pool, &new_doc).await.expect("create doc");
    assert_eq!(doc.repository_id, repo.id);

    // Job lifecycle: pending -> running stamps started_at, completion stamps
    // completed_at.
    let job = Job::create(&pool, &NewJob::new(JobType::Analysis, repo.id))
        .await
        .expect("create job");
    assert_eq!(job.status, JobStatus::Pending);
    assert!(job.started_at.is_none());

    let job = Job::update_status(&pool, job.id, JobStatus::Running)
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(job.status, JobStatus::Running);
    assert!(job.started_at.is_some());
    assert!(job.completed_at.is_none());

    let job = Job::complete(&pool, job.id, serde_json::json!({"documents": 1}))
        .await
        .expect("complete")
        .expect("exists");
    assert_eq!(job.status, JobStatus::Completed);
    assert!(job.completed_at.is_some());

    // Vector document associated with the repository
    let embedding = Embedding::new(vec![0.1; 1536]).expect("dimensions");
    let new_vec = NewVectorDocument::new("Integration vector content.", embedding)
        .expect("valid content")
        .with_repository(repo.id)
        .with_document(doc.id)
        .with_document_type("text");
    let vec_doc = VectorDocument::create(&pool, new_vec)
        .await
        .expect("create vector doc");
    assert_eq!(vec_doc.repository_id, Some(repo.id));

    // A vector document without association survives repository deletion.
    let orphan_embedding = Embedding::new(vec![0.2; 1536]).expect("dimensions");
    let orphan = VectorDocument::create(
        &pool,
        NewVectorDocument::new("Unassociated vector content.", orphan_embedding)
            .expect("valid content"),
    )
    .await
    .expect("create orphan");

    // Deleting the repository cascades to documents, jobs, and associated
    // vector documents.
    assert!(Repository::delete(&pool, repo.id).await.expect("delete"));
    assert!(Document::find_by_id(&pool, doc.id)
        .await
        .expect("query")
        .is_none());
    assert!(Job::find_by_id(&pool, job.id).await.expect("query").is_none());
    assert!(VectorDocument::find_by_id(&pool, vec_doc.id)
        .await
        .expect("query")
        .is_none());
    assert!(VectorDocument::find_by_id(&pool, orphan.id)
        .await
        .expect("query")
        .is_some());

    VectorDocument::delete(&pool, orphan.id)
        .await
        .expect("cleanup");
    manager.shutdown().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL with pgvector
async fn test_failed_session_rolls_back_and_propagates_the_original_error() {
    let manager = manager_from_env();
    let pool = manager.engine().await.expect("pool");
    migrations::run_all(&pool).await.expect("migrations");

    let url = unique_repo_url("rollback");
    let new_repo = NewRepository::new("rollback", url.clone()).expect("valid url");

    let err = manager
        .with_session::<(), _>(|session| {
            Box::pin(async move {
                Repository::create(&mut **session, &new_repo)
                    .await
                    .expect("insert inside session");
                Err(CodevaultError::Database("boom".to_string()))
            })
        })
        .await
        .unwrap_err();

    // The original failure is re-raised unchanged.
    assert!(matches!(err, CodevaultError::Database(ref msg) if msg == "boom"));

    // The uncommitted insert was rolled back.
    let found = Repository::find_by_url(&pool, &url).await.expect("query");
    assert!(found.is_none());

    manager.shutdown().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL with pgvector
async fn test_comprehensive_health_check_reports_all_probes_healthy() {
    let manager = manager_from_env();
    let pool = manager.engine().await.expect("pool");
    migrations::run_all(&pool).await.expect("migrations");

    let checker = DatabaseHealthChecker::new(Arc::clone(&manager));
    let report = checker.comprehensive_health_check().await;

    assert!(report.is_healthy(), "report: {report:?}");
    for check in ["connectivity", "pgvector_extension", "vector_operations"] {
        assert!(
            report.checks[check].status.is_healthy(),
            "{check} should be healthy"
        );
    }

    let pool_check = &report.checks["connection_pool"];
    assert!(pool_check.status.is_healthy());
    let counters = pool_check.pool.expect("pool counters");
    assert_eq!(
        counters.total_connections,
        counters.pool_size + counters.overflow
    );

    manager.shutdown().await;
}

#[tokio::test]
#[ignore] // Requires PostgreSQL with pgvector
async fn test_unique_repository_url_is_enforced() {
    let manager = manager_from_env();
    let pool = manager.engine().await.expect("pool");
    migrations::run_all(&pool).await.expect("migrations");

    let url = unique_repo_url("unique");
    let new_repo = NewRepository::new("unique", url.clone()).expect("valid url");
    let repo = Repository::create(&pool, &new_repo).await.expect("create");

    let duplicate = Repository::create(&pool, &new_repo).await;
    assert!(duplicate.is_err(), "duplicate url must be rejected");

    Repository::delete(&pool, repo.id).await.expect("cleanup");
    manager.shutdown().await;
}

#[tokio::test]
async fn test_manager_with_unreachable_address_reports_unhealthy_probes() {
    // No live database needed: the pool is built lazily against a port
    // nothing listens on, so every session-backed probe downgrades.
    let config = DatabaseConfig {
        database_url: "postgresql://127.0.0.1:9/codevault_unreachable".to_string(),
        pool_timeout_secs: 1,
        ..DatabaseConfig::new("")
    };
    let manager = Arc::new(ConnectionManager::new(config));
    let checker = DatabaseHealthChecker::new(Arc::clone(&manager));

    let report = checker.comprehensive_health_check().await;
    assert!(!report.is_healthy());
    assert!(!report.checks["connectivity"].status.is_healthy());
    assert!(!report.checks["pgvector_extension"].status.is_healthy());
    // Pool counters remain readable even when the store is unreachable.
    assert!(report.checks["connection_pool"].status.is_healthy());

    manager.shutdown().await;
}
