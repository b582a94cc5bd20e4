#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Codevault Core
//!
//! Async PostgreSQL storage core for repository ingestion, background job
//! tracking, and pgvector-backed document embeddings.
//!
//! ## Overview
//!
//! This crate is the data layer of a service that clones source-code
//! repositories, extracts their documents, and stores fixed-dimension
//! embedding vectors alongside them. It owns three concerns:
//!
//! - **Connection management**: one lazily-built connection pool per process,
//!   handed out through transaction-scoped sessions that always roll back on
//!   failure.
//! - **Health diagnostics**: independent probes for connectivity, the
//!   pgvector extension, and pool saturation, composed into a single report.
//! - **Entity models**: repositories, documents, jobs, and vector documents,
//!   with field invariants enforced at construction.
//!
//! The web layer, the task queue, and tracing configuration live outside this
//! crate and consume it through [`database::ConnectionManager`] and
//! [`database::DatabaseHealthChecker`].
//!
//! ## Module Organization
//!
//! - [`models`] - Domain entities and their invariants
//! - [`database`] - Connection pooling, scoped sessions, health checks, migrations
//! - [`config`] - Pool configuration from the environment
//! - [`error`] - Structured error handling
//! - [`logging`] - Tracing initialization
//! - [`validation`] - JSON payload bounds
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use codevault_core::config::DatabaseConfig;
//! use codevault_core::database::ConnectionManager;
//! use codevault_core::models::{NewRepository, Repository};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(ConnectionManager::from_env()?);
//!
//! let new_repo = NewRepository::new("codevault", "https://github.com/codevault-systems/codevault")?;
//! let repo = manager
//!     .with_session(|session| {
//!         Box::pin(async move {
//!             let repo = Repository::create(&mut **session, &new_repo).await?;
//!             Ok(repo)
//!         })
//!     })
//!     .await?;
//!
//! println!("tracking {} ({})", repo.name, repo.status);
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod validation;

pub use config::DatabaseConfig;
pub use database::{
    ConnectionManager, DatabaseHealthChecker, HealthReport, HealthStatus, PoolStatus, Session,
};
pub use error::{CodevaultError, Result, ValidationError};
pub use models::{
    Document, Embedding, Job, JobStatus, JobType, NewDocument, NewJob, NewRepository,
    NewVectorDocument, Repository, RepositoryStatus, VectorDocument, EMBEDDING_DIMENSIONS,
};
