//! # Database Layer
//!
//! Connection pooling, scoped sessions, health diagnostics, and schema
//! migrations for the PostgreSQL store.
//!
//! ## Key Components
//!
//! - [`connection`] - Pooled engine management and scoped session access
//! - [`health`] - Connectivity, pgvector, and pool saturation probes
//! - [`migrations`] - Embedded schema migrations
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use codevault_core::config::DatabaseConfig;
//! use codevault_core::database::{ConnectionManager, DatabaseHealthChecker};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = Arc::new(ConnectionManager::new(DatabaseConfig::from_env()?));
//! let checker = DatabaseHealthChecker::new(Arc::clone(&manager));
//!
//! let report = checker.comprehensive_health_check().await;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//!
//! manager.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod health;
pub mod migrations;

pub use connection::{ConnectionManager, Session};
pub use health::{CheckResult, DatabaseHealthChecker, HealthReport, HealthStatus, PoolStatus};
pub use migrations::MIGRATOR;
