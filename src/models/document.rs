//! # Document Model
//!
//! A source document extracted from a repository. Owned exclusively by its
//! repository (cascade delete); `(repository_id, file_path)` is unique.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};

/// A document row belonging to a repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub repository_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New document for creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    pub file_path: Option<String>,
    pub file_type: Option<String>,
    pub repository_id: i64,
}

impl NewDocument {
    /// Construct a new document record. Content must be non-empty after
    /// trimming whitespace.
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        repository_id: i64,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent {
                field: "document content",
            });
        }
        Ok(Self {
            title: title.into(),
            content,
            file_path: None,
            file_type: None,
            repository_id,
        })
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_file_type(mut self, file_type: impl Into<String>) -> Self {
        self.file_type = Some(file_type.into());
        self
    }
}

impl Document {
    /// Insert a new document
    pub async fn create(
        executor: impl PgExecutor<'_>,
        new: &NewDocument,
    ) -> Result<Document, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (title, content, file_path, file_type, repository_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, content, file_path, file_type, repository_id,
                      created_at, updated_at
            "#,
        )
        .bind(&new.title)
        .bind(&new.content)
        .bind(&new.file_path)
        .bind(&new.file_type)
        .bind(new.repository_id)
        .fetch_one(executor)
        .await
    }

    /// Find a document by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<Document>, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT id, title, content, file_path, file_type, repository_id,
                   created_at, updated_at
            FROM documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// List a repository's documents, newest first
    pub async fn list_by_repository(
        executor: impl PgExecutor<'_>,
        repository_id: i64,
    ) -> Result<Vec<Document>, sqlx::Error> {
        sqlx::query_as::<_, Document>(
            r#"
            SELECT id, title, content, file_path, file_type, repository_id,
                   created_at, updated_at
            FROM documents
            WHERE repository_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(repository_id)
        .fetch_all(executor)
        .await
    }

    /// Delete a document
    pub async fn delete(executor: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
