//! Database connection health checks

use crate::error::Result;
use sqlx::PgPool;
use tracing::debug;

/// Round-trip a trivial query through the pool
pub async fn check_pool_health(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").fetch_one(pool).await?;
    debug!("Database health check passed");
    Ok(())
}

/// Database pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of connections in the pool
    pub size: u32,
    /// Number of idle connections
    pub idle: usize,
}

impl PoolStats {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle(),
        }
    }

    pub fn active(&self) -> u32 {
        self.size.saturating_sub(self.idle as u32)
    }
}
