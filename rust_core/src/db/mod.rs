//! Postgres collaborators
//!
//! Pool setup, transient-error retry, health checks and the Postgres
//! implementations of the registry and store traits.
//!
//! Tables (see `migrations/`):
//! - `teams(id, name, short_name)` and `team_aliases(alias, team_id)`
//! - `matches(external_id, id, home_team_id, away_team_id, match_time,
//!   state_id, home_score, away_score, half_time_home, half_time_away)`
//! - `predictions(...)` mirroring `PredictionRecord`
//! - `match_links(...)` mirroring `MatchLink`, plus the settlement rule,
//!   reason and score snapshot

use crate::error::Result;
use sqlx::PgPool;
use tracing::info;

pub mod health;
pub mod matches;
pub mod pool;
pub mod predictions;
pub mod retry;
pub mod teams;

pub use health::{check_pool_health, PoolStats};
pub use matches::PgMatchRegistry;
pub use pool::{create_pool, DbPoolConfig};
pub use predictions::PgPredictionStore;
pub use retry::{execute_with_retry, RetryPolicy};
pub use teams::PgTeamRegistry;

/// Apply pending schema migrations
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}
