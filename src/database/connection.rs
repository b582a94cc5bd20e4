//! # Connection Management
//!
//! Owns one pooled engine per process lifetime and hands out safely-scoped
//! sessions.
//!
//! The manager is constructed once at process start and passed by reference
//! (typically as an `Arc`) to every consumer. The underlying pool is built
//! lazily on first acquisition and guarded by an async mutex, so concurrent
//! first calls observe a single construction rather than racing to rebuild.
//!
//! Sessions are transaction-scoped: [`ConnectionManager::with_session`] begins
//! a transaction, runs the caller's operation, commits on success, and on any
//! failure issues an explicit rollback before propagating the original error.
//! The caller never manages checkout or checkin. If the surrounding task is
//! cancelled mid-scope, dropping the uncommitted transaction rolls it back.

use crate::config::DatabaseConfig;
use crate::error::{CodevaultError, Result};
use futures::future::BoxFuture;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool, Postgres, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// A scoped unit of work over one pooled connection.
pub type Session<'t> = Transaction<'t, Postgres>;

/// Pooled engine manager with lazy construction and scoped session access.
pub struct ConnectionManager {
    config: DatabaseConfig,
    engine: Mutex<Option<PgPool>>,
}

impl ConnectionManager {
    /// Create a manager from explicit configuration. The pool is not built
    /// until the first acquisition.
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            engine: Mutex::new(None),
        }
    }

    /// Create a manager from environment configuration.
    ///
    /// Fails with a configuration error if `DATABASE_URL` is absent.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(DatabaseConfig::from_env()?))
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Get or lazily create the pooled engine.
    ///
    /// The first call constructs the pool from the manager's configuration;
    /// subsequent calls return a handle to the same pool. Fails with a
    /// configuration error if the target address is absent or unparseable.
    pub async fn engine(&self) -> Result<PgPool> {
        let mut guard = self.engine.lock().await;
        if let Some(pool) = guard.as_ref() {
            return Ok(pool.clone());
        }

        let pool = self.build_pool()?;
        info!(
            pool_size = self.config.pool_size,
            max_overflow = self.config.max_overflow,
            pool_timeout_secs = self.config.pool_timeout_secs,
            pool_recycle_secs = self.config.pool_recycle_secs,
            pre_ping = self.config.pool_pre_ping,
            "Database pool initialized"
        );
        *guard = Some(pool.clone());
        Ok(pool)
    }

    /// Whether the pooled engine has been constructed.
    pub async fn is_initialized(&self) -> bool {
        self.engine.lock().await.is_some()
    }

    /// Run an operation inside a scoped session.
    ///
    /// Begins a transaction on a pooled connection, invokes `op`, and commits
    /// on success. On failure the uncommitted work is explicitly rolled back
    /// and the original error is propagated unchanged. Checkout failures
    /// (pool exhausted, store unreachable) surface as
    /// [`CodevaultError::ConnectionAcquisition`]; the manager does not retry.
    pub async fn with_session<T, F>(&self, op: F) -> Result<T>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut Session<'static>) -> BoxFuture<'t, Result<T>>,
    {
        let pool = self.engine().await?;
        let mut session = pool.begin().await.map_err(CodevaultError::from)?;

        match op(&mut session).await {
            Ok(value) => {
                session.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback().await {
                    warn!(error = %rollback_err, "Session rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Dispose the pooled engine, closing all pooled connections, and reset
    /// to uninitialized so a subsequent acquisition builds a fresh pool.
    ///
    /// Idempotent: shutting down an already-uninitialized manager is a no-op.
    pub async fn shutdown(&self) {
        let mut guard = self.engine.lock().await;
        if let Some(pool) = guard.take() {
            info!("Closing database pool");
            pool.close().await;
        } else {
            debug!("Shutdown requested but pool was not initialized");
        }
    }

    fn build_pool(&self) -> Result<PgPool> {
        if self.config.database_url.trim().is_empty() {
            return Err(CodevaultError::Configuration(
                "database url must not be empty".to_string(),
            ));
        }

        let mut connect_options: PgConnectOptions =
            self.config.database_url.parse().map_err(|err| {
                CodevaultError::Configuration(format!("invalid database url: {err}"))
            })?;

        connect_options = if self.config.echo {
            connect_options.log_statements(log::LevelFilter::Info)
        } else {
            connect_options.log_statements(log::LevelFilter::Off)
        };

        // connect_lazy: physical connections are dialed on first checkout,
        // not at pool construction.
        let pool = PgPoolOptions::new()
            .min_connections(self.config.pool_size)
            .max_connections(self.config.max_connections())
            .acquire_timeout(self.config.pool_timeout())
            .max_lifetime(self.config.pool_recycle())
            .test_before_acquire(self.config.pool_pre_ping)
            .connect_lazy_with(connect_options);

        Ok(pool)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("pool_size", &self.config.pool_size)
            .field("max_overflow", &self.config.max_overflow)
            .finish_non_exhaustive()
    }
}
