//! Postgres connection pool configuration

use crate::config::env_parse;
use crate::error::{CoreError, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Database pool configuration
#[derive(Clone, Debug)]
pub struct DbPoolConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections to maintain
    pub min_connections: u32,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
    /// Maximum idle time before a connection is closed
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbPoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 2,
            max_lifetime: Duration::from_secs(1800),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl DbPoolConfig {
    /// Load `DB_POOL_*` variables, defaults otherwise
    pub fn from_env() -> Self {
        let d = Self::default();
        let max_connections = env_parse::<u32>("DB_POOL_MAX_CONNECTIONS")
            .unwrap_or(d.max_connections)
            .max(1);
        Self {
            max_connections,
            min_connections: env_parse::<u32>("DB_POOL_MIN_CONNECTIONS")
                .unwrap_or(d.min_connections)
                .min(max_connections),
            max_lifetime: env_parse("DB_POOL_MAX_LIFETIME_SECS")
                .map(Duration::from_secs)
                .unwrap_or(d.max_lifetime),
            idle_timeout: env_parse("DB_POOL_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(d.idle_timeout),
            acquire_timeout: env_parse("DB_POOL_ACQUIRE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(d.acquire_timeout),
        }
    }

    /// Small pool for a single worker process running paced batches
    pub fn worker() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            ..Default::default()
        }
    }
}

/// Create a PostgreSQL connection pool
pub async fn create_pool(database_url: &str, config: &DbPoolConfig) -> Result<PgPool> {
    info!(
        "Creating database pool: max={}, min={}, acquire_timeout={:?}",
        config.max_connections, config.min_connections, config.acquire_timeout
    );

    let connect_opts = PgConnectOptions::from_str(database_url)
        .map_err(|e| CoreError::Config(format!("invalid database URL: {}", e)))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(connect_opts)
        .await?;

    info!("Database pool created");
    Ok(pool)
}
