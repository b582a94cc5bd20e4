//! # Entity Models
//!
//! Domain entities with construction-time invariants: repositories, their
//! documents and jobs, and pgvector-backed vector documents.
//!
//! Each entity has a row struct mapped with `FromRow` and a `New*` companion
//! whose constructor enforces the field invariants (URL shape, non-empty
//! content, embedding dimensionality, payload bounds). CRUD methods accept
//! any `PgExecutor`, so they run equally against the pool or inside a scoped
//! session. Timestamps are assigned by the storage layer, never by the
//! entity.

pub mod document;
pub mod job;
pub mod repository;
pub mod vector_document;

pub use document::{Document, NewDocument};
pub use job::{Job, JobStatus, JobType, NewJob};
pub use repository::{NewRepository, Repository, RepositoryStatus};
pub use vector_document::{
    Embedding, NewVectorDocument, VectorDocument, EMBEDDING_DIMENSIONS,
};
