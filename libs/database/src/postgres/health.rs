use sea_orm::{ConnectionTrait, DatabaseBackend, DatabaseConnection, Statement};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::common::DatabaseError;

/// Run `SELECT 1` and report how long it took.
///
/// Used once at startup before services are marked SERVING.
///
/// # Example
/// ```ignore
/// let elapsed = check_health(&db).await?;
/// info!(latency_ms = elapsed.as_millis() as u64, "Database reachable");
/// ```
pub async fn check_health(db: &DatabaseConnection) -> Result<Duration, DatabaseError> {
    let start = Instant::now();
    let stmt = Statement::from_string(DatabaseBackend::Postgres, "SELECT 1".to_owned());

    db.query_one_raw(stmt)
        .await
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("PostgreSQL: {}", e)))?;

    let elapsed = start.elapsed();
    debug!(latency_ms = elapsed.as_millis() as u64, "PostgreSQL health check passed");
    Ok(elapsed)
}
