//! # Job Model
//!
//! A background processing job owned by a repository (cascade delete).
//!
//! Status transitions are caller-driven; the storage layer stamps
//! `started_at` when a job first moves to running and `completed_at` when it
//! reaches a terminal state. Params and result payloads are opaque JSON,
//! bounded by the payload validation rules before persistence.

use crate::error::ValidationError;
use crate::validation::validate_payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;

const JOB_TYPES: &str = "clone, analysis, embedding, indexing, cleanup";
const JOB_STATUSES: &str = "pending, running, completed, failed, cancelled";

/// Kind of work a job performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "job_type", rename_all = "lowercase")]
pub enum JobType {
    Clone,
    Analysis,
    Embedding,
    Indexing,
    Cleanup,
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clone => write!(f, "clone"),
            Self::Analysis => write!(f, "analysis"),
            Self::Embedding => write!(f, "embedding"),
            Self::Indexing => write!(f, "indexing"),
            Self::Cleanup => write!(f, "cleanup"),
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clone" => Ok(Self::Clone),
            "analysis" => Ok(Self::Analysis),
            "embedding" => Ok(Self::Embedding),
            "indexing" => Ok(Self::Indexing),
            "cleanup" => Ok(Self::Cleanup),
            _ => Err(ValidationError::UnknownEnumValue {
                kind: "job type",
                value: s.to_string(),
                accepted: JOB_TYPES,
            }),
        }
    }
}

/// Job execution state.
///
/// Documented flow: pending → running → {completed, failed, cancelled}, with
/// cancelled also reachable from pending. Transitions are not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "job_status", rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Check if this is a terminal state (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if the job is being processed
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ValidationError::UnknownEnumValue {
                kind: "job status",
                value: s.to_string(),
                accepted: JOB_STATUSES,
            }),
        }
    }
}

/// A background job row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub job_type: JobType,
    pub status: JobStatus,
    pub params: Option<serde_json::Value>,
    pub result: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub repository_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// New job for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJob {
    pub job_type: JobType,
    pub params: Option<serde_json::Value>,
    pub repository_id: i64,
}

impl NewJob {
    pub fn new(job_type: JobType, repository_id: i64) -> Self {
        Self {
            job_type,
            params: None,
            repository_id,
        }
    }

    /// Attach a params payload, validating its size and shape bounds.
    pub fn with_params(mut self, params: serde_json::Value) -> Result<Self, ValidationError> {
        validate_payload(&params)?;
        self.params = Some(params);
        Ok(self)
    }
}

impl Job {
    /// Insert a new job in the pending state
    pub async fn create(executor: impl PgExecutor<'_>, new: &NewJob) -> Result<Job, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (job_type, params, repository_id)
            VALUES ($1, $2, $3)
            RETURNING id, job_type, status, params, result, error_message, repository_id,
                      created_at, updated_at, started_at, completed_at
            "#,
        )
        .bind(new.job_type)
        .bind(&new.params)
        .bind(new.repository_id)
        .fetch_one(executor)
        .await
    }

    /// Find a job by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, job_type, status, params, result, error_message, repository_id,
                   created_at, updated_at, started_at, completed_at
            FROM jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// List a repository's jobs, newest first
    pub async fn list_by_repository(
        executor: impl PgExecutor<'_>,
        repository_id: i64,
    ) -> Result<Vec<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            SELECT id, job_type, status, params, result, error_message, repository_id,
                   created_at, updated_at, started_at, completed_at
            FROM jobs
            WHERE repository_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(repository_id)
        .fetch_all(executor)
        .await
    }

    /// Move a job to a new state.
    ///
    /// The storage layer stamps `started_at` on the first move to running and
    /// `completed_at` on reaching a terminal state.
    pub async fn update_status(
        executor: impl PgExecutor<'_>,
        id: i64,
        status: JobStatus,
    ) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = $2,
                started_at = CASE
                    WHEN $2 = 'running'::job_status AND started_at IS NULL THEN now()
                    ELSE started_at
                END,
                completed_at = CASE
                    WHEN $2 IN ('completed'::job_status, 'failed'::job_status, 'cancelled'::job_status)
                        THEN now()
                    ELSE completed_at
                END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, job_type, status, params, result, error_message, repository_id,
                      created_at, updated_at, started_at, completed_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await
    }

    /// Mark a job completed with its result payload
    pub async fn complete(
        executor: impl PgExecutor<'_>,
        id: i64,
        result: serde_json::Value,
    ) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = 'completed'::job_status,
                result = $2,
                completed_at = now(),
                updated_at = now()
            WHERE id = $1
            RETURNING id, job_type, status, params, result, error_message, repository_id,
                      created_at, updated_at, started_at, completed_at
            "#,
        )
        .bind(id)
        .bind(result)
        .fetch_optional(executor)
        .await
    }

    /// Mark a job failed with an error message
    pub async fn fail(
        executor: impl PgExecutor<'_>,
        id: i64,
        error_message: &str,
    ) -> Result<Option<Job>, sqlx::Error> {
        sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET status = 'failed'::job_status,
                error_message = $2,
                completed_at = now(),
                updated_at = now()
            WHERE id = $1
            RETURNING id, job_type, status, params, result, error_message, repository_id,
                      created_at, updated_at, started_at, completed_at
            "#,
        )
        .bind(id)
        .bind(error_message)
        .fetch_optional(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_job_status_parses() {
        for raw in ["pending", "running", "completed", "failed", "cancelled"] {
            assert!(raw.parse::<JobStatus>().is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn test_invalid_job_status_is_rejected_with_accepted_values() {
        let err = "invalid_status".parse::<JobStatus>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("invalid_status"));
        assert!(message.contains("pending, running, completed, failed, cancelled"));
    }

    #[test]
    fn test_job_type_string_conversion() {
        assert_eq!(JobType::Embedding.to_string(), "embedding");
        assert_eq!("cleanup".parse::<JobType>().unwrap(), JobType::Cleanup);
        assert!("compile".parse::<JobType>().is_err());
    }

    #[test]
    fn test_job_status_terminal_check() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Running.is_active());
    }

    #[test]
    fn test_job_status_default_and_serde() {
        assert_eq!(JobStatus::default(), JobStatus::Pending);

        let json = serde_json::to_string(&JobStatus::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_new_job_params_are_validated() {
        let job = NewJob::new(JobType::Clone, 1)
            .with_params(json!({"depth": 1, "recurse_submodules": false}))
            .unwrap();
        assert!(job.params.is_some());

        // A payload nested past the depth bound is rejected.
        let mut deep = json!("leaf");
        for _ in 0..40 {
            deep = json!([deep]);
        }
        assert!(NewJob::new(JobType::Clone, 1).with_params(deep).is_err());
    }
}
