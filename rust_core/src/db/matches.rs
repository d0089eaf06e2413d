use super::retry::{execute_with_retry, RetryPolicy};
use crate::error::{CoreError, Result};
use crate::models::{FinishedMatch, MatchRecord, MatchState, ScoreData, LIVE_STATES};
use crate::registry::MatchRegistry;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// Overtime is reported under two provider ids
const OVERTIME_ALT_STATE_ID: i16 = 6;

/// Fixture registry backed by the `matches` table
#[derive(Clone)]
pub struct PgMatchRegistry {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgMatchRegistry {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(pool, RetryPolicy::default())
    }
}

fn live_state_ids() -> Vec<i16> {
    let mut ids: Vec<i16> = LIVE_STATES.iter().map(MatchState::id).collect();
    ids.push(OVERTIME_ALT_STATE_ID);
    ids
}

fn match_from_row(row: &PgRow) -> std::result::Result<MatchRecord, sqlx::Error> {
    Ok(MatchRecord {
        external_id: row.try_get("external_id")?,
        uuid: row.try_get("id")?,
        home_team_id: row.try_get("home_team_id")?,
        away_team_id: row.try_get("away_team_id")?,
        match_time: row.try_get("match_time")?,
        state: MatchState::from_id(row.try_get("state_id")?),
        home_name: row.try_get("home_name")?,
        away_name: row.try_get("away_name")?,
    })
}

fn finished_from_row(row: &PgRow) -> std::result::Result<FinishedMatch, sqlx::Error> {
    Ok(FinishedMatch {
        external_id: row.try_get("external_id")?,
        state: MatchState::from_id(row.try_get("state_id")?),
        score: ScoreData {
            home: row.try_get("home_score")?,
            away: row.try_get("away_score")?,
            half_time_home: row.try_get("half_time_home")?,
            half_time_away: row.try_get("half_time_away")?,
        },
    })
}

#[async_trait]
impl MatchRegistry for PgMatchRegistry {
    async fn live_matches_for_team(&self, team_id: i64, limit: usize) -> Result<Vec<MatchRecord>> {
        let limit = limit as i64;
        let states = live_state_ids();
        let half_time = MatchState::HalfTime.id();

        let rows = execute_with_retry(&self.retry, "live_matches_for_team", || {
            let states = states.clone();
            async move {
                sqlx::query(
                    r#"
                    SELECT m.external_id, m.id, m.home_team_id, m.away_team_id,
                           m.match_time, m.state_id,
                           h.name AS home_name, a.name AS away_name
                    FROM matches m
                    JOIN teams h ON h.id = m.home_team_id
                    JOIN teams a ON a.id = m.away_team_id
                    WHERE (m.home_team_id = $1 OR m.away_team_id = $1)
                      AND m.state_id = ANY($2)
                    ORDER BY CASE WHEN m.state_id = $3 THEN 1 ELSE 0 END,
                             m.match_time DESC
                    LIMIT $4
                    "#,
                )
                .bind(team_id)
                .bind(states)
                .bind(half_time)
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(CoreError::from)
            }
        })
        .await?;

        rows.iter()
            .map(|row| match_from_row(row).map_err(CoreError::from))
            .collect()
    }

    async fn finished_match(&self, external_id: &str) -> Result<Option<FinishedMatch>> {
        let finished = MatchState::Finished.id();

        let row = execute_with_retry(&self.retry, "finished_match", || async move {
            sqlx::query(
                r#"
                SELECT external_id, state_id, home_score, away_score,
                       half_time_home, half_time_away
                FROM matches
                WHERE external_id = $1 AND state_id = $2
                "#,
            )
            .bind(external_id)
            .bind(finished)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::from)
        })
        .await?;

        row.as_ref()
            .map(finished_from_row)
            .transpose()
            .map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_state_ids() {
        let ids = live_state_ids();
        assert_eq!(ids, vec![2, 3, 4, 5, 7, 6]);
        assert!(!ids.contains(&MatchState::Finished.id()));
    }
}
