//! Operational health check for the storage layer.
//!
//! Loads configuration from the environment, runs the comprehensive database
//! health check, prints the JSON report, and exits non-zero when unhealthy.
//! Intended for readiness probes and on-call diagnostics.

use std::sync::Arc;

use anyhow::Result;
use codevault_core::config::DatabaseConfig;
use codevault_core::database::{ConnectionManager, DatabaseHealthChecker};
use codevault_core::logging::init_structured_logging;

#[tokio::main]
async fn main() -> Result<()> {
    init_structured_logging();

    let config = DatabaseConfig::from_env()?;
    let manager = Arc::new(ConnectionManager::new(config));
    let checker = DatabaseHealthChecker::new(Arc::clone(&manager));

    let report = checker.comprehensive_health_check().await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    manager.shutdown().await;

    if !report.is_healthy() {
        std::process::exit(1);
    }
    Ok(())
}
