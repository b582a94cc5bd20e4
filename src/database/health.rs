//! # Database Health Diagnostics
//!
//! Layered health checks over the connection manager: basic connectivity, the
//! pgvector extension, and connection pool saturation, each independently
//! callable and composed into one report.
//!
//! Probe failures never escape this module. A failed query, a missing
//! extension, or an unreadable counter downgrades the affected sub-check (and
//! therefore the composite status) to unhealthy; the probe methods themselves
//! are infallible.

use crate::database::connection::ConnectionManager;
use serde::Serialize;
use sqlx::Row;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Health status of a single check or the composite report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Live connection pool counters.
///
/// `pool_size` is the configured steady size; `overflow` counts live
/// connections beyond it; `total_connections` is their sum.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoolStatus {
    pub pool_size: u32,
    pub checked_in: u32,
    pub checked_out: u32,
    pub overflow: u32,
    pub total_connections: u32,
}

impl PoolStatus {
    /// Derive the report counters from the configured steady size and the
    /// pool's live size/idle readings.
    pub fn from_counters(pool_size: u32, live_size: u32, checked_in: u32) -> Self {
        let overflow = live_size.saturating_sub(pool_size);
        Self {
            pool_size,
            checked_in,
            checked_out: live_size.saturating_sub(checked_in),
            overflow,
            total_connections: pool_size + overflow,
        }
    }
}

/// Result of a single named sub-check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub pool: Option<PoolStatus>,
}

impl CheckResult {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: Some(message.into()),
            pool: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            pool: None,
        }
    }

    pub fn pool(counters: PoolStatus) -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            pool: Some(counters),
        }
    }
}

/// Composite health report: one flat mapping of named sub-checks plus a
/// top-level timestamp. Unhealthy iff any sub-check is unhealthy.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub timestamp: String,
    pub checks: HashMap<String, CheckResult>,
}

impl HealthReport {
    fn new() -> Self {
        Self {
            status: HealthStatus::Healthy,
            timestamp: chrono::Utc::now().to_rfc3339(),
            checks: HashMap::new(),
        }
    }

    /// Record a named sub-check, downgrading the composite status if the
    /// check is unhealthy.
    fn record(&mut self, name: &str, check: CheckResult) {
        if !check.status.is_healthy() {
            self.status = HealthStatus::Unhealthy;
        }
        self.checks.insert(name.to_string(), check);
    }

    /// Fold another report's sub-checks into this one.
    fn merge(&mut self, other: HealthReport) {
        if !other.status.is_healthy() {
            self.status = HealthStatus::Unhealthy;
        }
        self.checks.extend(other.checks);
    }

    pub fn is_healthy(&self) -> bool {
        self.status.is_healthy()
    }
}

/// Database health checker for monitoring connectivity, vector operations,
/// and pool saturation.
pub struct DatabaseHealthChecker {
    manager: Arc<ConnectionManager>,
}

impl DatabaseHealthChecker {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// Check basic database connectivity with a trivial query.
    pub async fn check_basic_connectivity(&self) -> HealthReport {
        let mut report = HealthReport::new();

        let outcome = self
            .manager
            .with_session(|session| {
                Box::pin(async move {
                    sqlx::query("SELECT 1").fetch_one(&mut **session).await?;
                    Ok(())
                })
            })
            .await;

        match outcome {
            Ok(()) => report.record(
                "connectivity",
                CheckResult::healthy("Database connection successful"),
            ),
            Err(err) => {
                warn!(error = %err, "Connectivity check failed");
                report.record(
                    "connectivity",
                    CheckResult::unhealthy(format!("Database connection failed: {err}")),
                );
            }
        }

        report
    }

    /// Check that the pgvector extension is installed and operational.
    ///
    /// When the extension is present, a distance computation between two
    /// literal vectors confirms it actually works; the computed distance is
    /// reported under the `vector_operations` sub-check.
    pub async fn check_pgvector_extension(&self) -> HealthReport {
        let mut report = HealthReport::new();

        let outcome = self
            .manager
            .with_session(|session| {
                Box::pin(async move {
                    let extension =
                        sqlx::query("SELECT extversion FROM pg_extension WHERE extname = 'vector'")
                            .fetch_optional(&mut **session)
                            .await?;

                    let Some(row) = extension else {
                        return Ok(None);
                    };
                    let version: String = row.try_get("extversion")?;

                    let distance_row = sqlx::query(
                        "SELECT '[1,2,3]'::vector <-> '[4,5,6]'::vector AS distance",
                    )
                    .fetch_one(&mut **session)
                    .await?;
                    let distance: f64 = distance_row.try_get("distance")?;

                    Ok(Some((version, distance)))
                })
            })
            .await;

        match outcome {
            Ok(Some((version, distance))) => {
                report.record(
                    "pgvector_extension",
                    CheckResult::healthy(format!(
                        "pgvector extension version {version} is installed"
                    )),
                );
                report.record(
                    "vector_operations",
                    CheckResult::healthy(format!(
                        "Vector distance calculation successful: {distance}"
                    )),
                );
            }
            Ok(None) => report.record(
                "pgvector_extension",
                CheckResult::unhealthy("pgvector extension is not installed"),
            ),
            Err(err) => {
                warn!(error = %err, "pgvector check failed");
                report.record(
                    "pgvector_extension",
                    CheckResult::unhealthy(format!("pgvector check failed: {err}")),
                );
            }
        }

        report
    }

    /// Read live connection pool counters.
    ///
    /// Saturation itself never marks this check unhealthy; only a failure to
    /// read the counters does.
    pub async fn check_pool_status(&self) -> HealthReport {
        let mut report = HealthReport::new();

        match self.manager.engine().await {
            Ok(pool) => {
                let counters = PoolStatus::from_counters(
                    self.manager.config().pool_size,
                    pool.size(),
                    pool.num_idle() as u32,
                );
                report.record("connection_pool", CheckResult::pool(counters));
            }
            Err(err) => {
                warn!(error = %err, "Pool status check failed");
                report.record(
                    "connection_pool",
                    CheckResult::unhealthy(format!("Pool status check failed: {err}")),
                );
            }
        }

        report
    }

    /// Run all probes and merge their sub-checks into one composite report.
    pub async fn comprehensive_health_check(&self) -> HealthReport {
        let mut report = HealthReport::new();
        report.merge(self.check_basic_connectivity().await);
        report.merge(self.check_pgvector_extension().await);
        report.merge(self.check_pool_status().await);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_unhealthy_check_downgrades_the_composite() {
        let mut report = HealthReport::new();
        report.record("connectivity", CheckResult::healthy("ok"));
        assert!(report.is_healthy());

        report.record(
            "pgvector_extension",
            CheckResult::unhealthy("pgvector extension is not installed"),
        );
        assert_eq!(report.status, HealthStatus::Unhealthy);

        // A later healthy check does not mask the unhealthy one.
        report.record("connection_pool", CheckResult::healthy("ok"));
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_merge_carries_unhealthy_status_and_checks() {
        let mut composite = HealthReport::new();

        let mut connectivity = HealthReport::new();
        connectivity.record("connectivity", CheckResult::healthy("ok"));

        let mut extension = HealthReport::new();
        extension.record(
            "pgvector_extension",
            CheckResult::unhealthy("pgvector extension is not installed"),
        );

        composite.merge(connectivity);
        composite.merge(extension);

        assert_eq!(composite.status, HealthStatus::Unhealthy);
        assert_eq!(composite.checks.len(), 2);
        let check = &composite.checks["pgvector_extension"];
        assert!(check.message.as_deref().unwrap().contains("not installed"));
    }

    #[test]
    fn test_pool_counters_arithmetic() {
        // pool_size=10 with 3 live connections beyond it: total is 13.
        let counters = PoolStatus::from_counters(10, 13, 5);
        assert_eq!(counters.pool_size, 10);
        assert_eq!(counters.overflow, 3);
        assert_eq!(counters.total_connections, 13);
        assert_eq!(counters.checked_in, 5);
        assert_eq!(counters.checked_out, 8);

        // A pool below steady size reports zero overflow.
        let counters = PoolStatus::from_counters(10, 4, 4);
        assert_eq!(counters.overflow, 0);
        assert_eq!(counters.total_connections, 10);
        assert_eq!(counters.checked_out, 0);
    }

    #[test]
    fn test_report_serialization_shape() {
        let mut report = HealthReport::new();
        report.record("connectivity", CheckResult::healthy("ok"));
        report.record(
            "connection_pool",
            CheckResult::pool(PoolStatus::from_counters(10, 12, 6)),
        );

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json["timestamp"].is_string());
        assert_eq!(json["checks"]["connectivity"]["status"], "healthy");
        assert_eq!(json["checks"]["connectivity"]["message"], "ok");

        // Pool counters are flattened into the sub-check.
        let pool = &json["checks"]["connection_pool"];
        assert_eq!(pool["status"], "healthy");
        assert_eq!(pool["pool_size"], 10);
        assert_eq!(pool["overflow"], 2);
        assert_eq!(pool["total_connections"], 12);
        assert!(pool.get("message").is_none());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert_eq!(HealthStatus::Unhealthy.to_string(), "unhealthy");
        assert!(!HealthStatus::Unhealthy.is_healthy());
    }
}
