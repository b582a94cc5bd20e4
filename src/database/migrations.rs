//! # Schema Migrations
//!
//! The storage schema ships embedded in the binary; [`run_all`] brings a
//! database up to date. Migration files live under `migrations/` using the
//! `YYYYMMDDHHMMSS_description.sql` naming convention.

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::PgPool;
use tracing::info;

/// Embedded migrations, compiled in from the `migrations/` directory.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Apply all pending migrations in order. Safe to run repeatedly.
pub async fn run_all(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}
