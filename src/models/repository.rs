//! # Repository Model
//!
//! A tracked source-code repository. The repository owns its documents and
//! jobs: deleting a repository cascades to both.
//!
//! The `url` field must be a well-formed HTTP(S) URL pointing at the expected
//! code-hosting domain; it is validated at construction, not at persistence
//! time. Status values parse through [`RepositoryStatus`] so an invalid state
//! is unrepresentable once past the boundary.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use std::fmt;
use url::Url;

/// Host repositories are expected to live on
pub const EXPECTED_REPOSITORY_HOST: &str = "github.com";

const REPOSITORY_STATUSES: &str = "pending, cloning, processing, completed, failed";

/// Repository processing state.
///
/// Callers drive transitions; the documented flow is
/// pending → cloning → processing → completed, with failed reachable from any
/// non-terminal state. No transition graph is enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "repository_status", rename_all = "lowercase")]
pub enum RepositoryStatus {
    Pending,
    Cloning,
    Processing,
    Completed,
    Failed,
}

impl RepositoryStatus {
    /// Check if this is a terminal state (no further transitions expected)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl Default for RepositoryStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for RepositoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Cloning => write!(f, "cloning"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RepositoryStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "cloning" => Ok(Self::Cloning),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ValidationError::UnknownEnumValue {
                kind: "repository status",
                value: s.to_string(),
                accepted: REPOSITORY_STATUSES,
            }),
        }
    }
}

/// Validate that a repository URL is well-formed HTTP(S) and points at the
/// expected code-hosting domain.
pub fn validate_repository_url(raw: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(raw).map_err(|_| ValidationError::MalformedUrl {
        url: raw.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::MalformedUrl {
            url: raw.to_string(),
        });
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| ValidationError::MalformedUrl {
            url: raw.to_string(),
        })?;

    let canonical = host.strip_prefix("www.").unwrap_or(host);
    if canonical != EXPECTED_REPOSITORY_HOST {
        return Err(ValidationError::UnexpectedUrlHost {
            host: host.to_string(),
            expected: EXPECTED_REPOSITORY_HOST,
        });
    }

    Ok(())
}

/// A tracked source-code repository row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Repository {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub branch: String,
    pub status: RepositoryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New repository for creation; timestamps and status default are assigned by
/// the storage layer on insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepository {
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub branch: String,
}

impl NewRepository {
    /// Construct a new repository record, validating the URL shape and host.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Result<Self, ValidationError> {
        let url = url.into();
        validate_repository_url(&url)?;
        Ok(Self {
            name: name.into(),
            url,
            description: None,
            branch: "main".to_string(),
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }
}

impl Repository {
    /// Insert a new repository
    pub async fn create(
        executor: impl PgExecutor<'_>,
        new: &NewRepository,
    ) -> Result<Repository, sqlx::Error> {
        sqlx::query_as::<_, Repository>(
            r#"
            INSERT INTO repositories (name, url, description, branch)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, url, description, branch, status, created_at, updated_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.url)
        .bind(&new.description)
        .bind(&new.branch)
        .fetch_one(executor)
        .await
    }

    /// Find a repository by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Repository>, sqlx::Error> {
        sqlx::query_as::<_, Repository>(
            r#"
            SELECT id, name, url, description, branch, status, created_at, updated_at
            FROM repositories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Find a repository by its unique URL
    pub async fn find_by_url(
        executor: impl PgExecutor<'_>,
        url: &str,
    ) -> Result<Option<Repository>, sqlx::Error> {
        sqlx::query_as::<_, Repository>(
            r#"
            SELECT id, name, url, description, branch, status, created_at, updated_at
            FROM repositories
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(executor)
        .await
    }

    /// List repositories in a given state, newest first
    pub async fn list_by_status(
        executor: impl PgExecutor<'_>,
        status: RepositoryStatus,
    ) -> Result<Vec<Repository>, sqlx::Error> {
        sqlx::query_as::<_, Repository>(
            r#"
            SELECT id, name, url, description, branch, status, created_at, updated_at
            FROM repositories
            WHERE status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(executor)
        .await
    }

    /// Move a repository to a new state
    pub async fn update_status(
        executor: impl PgExecutor<'_>,
        id: i64,
        status: RepositoryStatus,
    ) -> Result<Option<Repository>, sqlx::Error> {
        sqlx::query_as::<_, Repository>(
            r#"
            UPDATE repositories
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, url, description, branch, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(executor)
        .await
    }

    /// Delete a repository. Owned documents and jobs are removed by the
    /// schema's cascade rules.
    pub async fn delete(executor: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM repositories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
