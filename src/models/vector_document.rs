//! # Vector Document Model
//!
//! An embedded content chunk stored in the `vector_documents` table.
//!
//! Unlike documents and jobs, a vector document is only advisorily associated
//! with a repository or document: both foreign keys are nullable (cascade on
//! delete), so a vector document may outlive its source.
//!
//! The embedding is a fixed 1536-dimension numeric vector, validated at
//! construction. [`Embedding::from_json`] is the boundary for untrusted
//! input and distinguishes not-a-sequence, non-numeric-element, and
//! wrong-length failures.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::{FromRow, PgExecutor};

/// Fixed dimensionality for stored embeddings
pub const EMBEDDING_DIMENSIONS: usize = 1536;

/// A validated, fixed-dimension embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Construct an embedding, checking dimensionality.
    pub fn new(values: Vec<f32>) -> Result<Self, ValidationError> {
        if values.len() != EMBEDDING_DIMENSIONS {
            return Err(ValidationError::EmbeddingDimensions {
                expected: EMBEDDING_DIMENSIONS,
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }

    /// Construct an embedding from untrusted JSON.
    ///
    /// The value must be an array, every element must be numeric, and the
    /// length must match [`EMBEDDING_DIMENSIONS`]; each failure is reported
    /// as its own validation error.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ValidationError> {
        let elements = value
            .as_array()
            .ok_or(ValidationError::EmbeddingNotASequence {
                found: json_type_name(value),
            })?;

        let mut values = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let number = element
                .as_f64()
                .ok_or(ValidationError::NonNumericEmbeddingElement { index })?;
            values.push(number as f32);
        }

        Self::new(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Embedding> for Vector {
    fn from(embedding: Embedding) -> Self {
        Vector::from(embedding.0)
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A stored vector document row
#[derive(Debug, Clone, FromRow)]
pub struct VectorDocument {
    pub id: i64,
    pub content: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub embedding: Vector,
    pub document_type: Option<String>,
    pub repository_id: Option<i64>,
    pub document_id: Option<i64>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New vector document for creation
#[derive(Debug, Clone)]
pub struct NewVectorDocument {
    pub content: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub embedding: Embedding,
    pub document_type: Option<String>,
    pub repository_id: Option<i64>,
    pub document_id: Option<i64>,
    pub file_path: Option<String>,
}

impl NewVectorDocument {
    /// Construct a new vector document. Content must be non-empty after
    /// trimming whitespace; the embedding is already validated by its type.
    pub fn new(content: impl Into<String>, embedding: Embedding) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::EmptyContent {
                field: "vector document content",
            });
        }
        Ok(Self {
            content,
            title: None,
            source_url: None,
            embedding,
            document_type: None,
            repository_id: None,
            document_id: None,
            file_path: None,
        })
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_source_url(mut self, source_url: impl Into<String>) -> Self {
        self.source_url = Some(source_url.into());
        self
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    pub fn with_repository(mut self, repository_id: i64) -> Self {
        self.repository_id = Some(repository_id);
        self
    }

    pub fn with_document(mut self, document_id: i64) -> Self {
        self.document_id = Some(document_id);
        self
    }

    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

impl VectorDocument {
    /// Insert a new vector document
    pub async fn create(
        executor: impl PgExecutor<'_>,
        new: NewVectorDocument,
    ) -> Result<VectorDocument, sqlx::Error> {
        sqlx::query_as::<_, VectorDocument>(
            r#"
            INSERT INTO vector_documents
                (content, title, source_url, embedding, document_type,
                 repository_id, document_id, file_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, content, title, source_url, embedding, document_type,
                      repository_id, document_id, file_path, created_at, updated_at
            "#,
        )
        .bind(new.content)
        .bind(new.title)
        .bind(new.source_url)
        .bind(Vector::from(new.embedding))
        .bind(new.document_type)
        .bind(new.repository_id)
        .bind(new.document_id)
        .bind(new.file_path)
        .fetch_one(executor)
        .await
    }

    /// Find a vector document by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: i64,
    ) -> Result<Option<VectorDocument>, sqlx::Error> {
        sqlx::query_as::<_, VectorDocument>(
            r#"
            SELECT id, content, title, source_url, embedding, document_type,
                   repository_id, document_id, file_path, created_at, updated_at
            FROM vector_documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// List the vector documents associated with a repository, newest first
    pub async fn list_by_repository(
        executor: impl PgExecutor<'_>,
        repository_id: i64,
    ) -> Result<Vec<VectorDocument>, sqlx::Error> {
        sqlx::query_as::<_, VectorDocument>(
            r#"
            SELECT id, content, title, source_url, embedding, document_type,
                   repository_id, document_id, file_path, created_at, updated_at
            FROM vector_documents
            WHERE repository_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(repository_id)
        .fetch_all(executor)
        .await
    }

    /// Delete a vector document
    pub async fn delete(executor: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vector_documents WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
