use super::retry::{execute_with_retry, RetryPolicy};
use crate::error::{CoreError, Result};
use crate::models::{
    LinkStatus, MatchLink, NewMatchLink, NewPrediction, Outcome, PredictionRecord,
    SettlementResult,
};
use crate::registry::PredictionStore;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

const PREDICTION_COLUMNS: &str = "id, external_id, bot_name, league_name, home_team_name, \
     away_team_name, score_at_prediction, minute_at_prediction, market_type, market_value, \
     raw_payload, processed, pending_reason, created_at";

const LINK_COLUMNS: &str = "id, prediction_id, match_external_id, home_confidence, \
     away_confidence, overall_confidence, status, matched_at, outcome, final_score, resolved_at";

/// Prediction store backed by the `predictions` and `match_links` tables
#[derive(Clone)]
pub struct PgPredictionStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgPredictionStore {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(pool, RetryPolicy::default())
    }
}

fn link_from_row(row: &PgRow) -> std::result::Result<MatchLink, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let outcome: Option<String> = row.try_get("outcome")?;
    Ok(MatchLink {
        id: row.try_get("id")?,
        prediction_id: row.try_get("prediction_id")?,
        match_external_id: row.try_get("match_external_id")?,
        home_confidence: row.try_get("home_confidence")?,
        away_confidence: row.try_get("away_confidence")?,
        overall_confidence: row.try_get("overall_confidence")?,
        status: LinkStatus::parse(&status),
        matched_at: row.try_get("matched_at")?,
        outcome: outcome.as_deref().and_then(Outcome::from_status),
        final_score: row.try_get("final_score")?,
        resolved_at: row.try_get("resolved_at")?,
    })
}

#[async_trait]
impl PredictionStore for PgPredictionStore {
    #[instrument(skip(self, prediction), fields(external_id = %prediction.external_id))]
    async fn create_prediction(&self, prediction: &NewPrediction) -> Result<PredictionRecord> {
        let record = PredictionRecord::from_new(prediction);

        let sql = format!(
            r#"
            INSERT INTO predictions ({PREDICTION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, FALSE, NULL, $12)
            RETURNING {PREDICTION_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, PredictionRecord>(&sql)
            .bind(record.id)
            .bind(&record.external_id)
            .bind(&record.bot_name)
            .bind(&record.league_name)
            .bind(&record.home_team_name)
            .bind(&record.away_team_name)
            .bind(&record.score_at_prediction)
            .bind(record.minute_at_prediction)
            .bind(&record.market_type)
            .bind(&record.market_value)
            .bind(&record.raw_payload)
            .bind(record.created_at)
            .fetch_one(&self.pool)
            .await?;

        debug!("Stored prediction {}", created.id);
        Ok(created)
    }

    async fn get_prediction(&self, id: Uuid) -> Result<Option<PredictionRecord>> {
        let sql = format!("SELECT {PREDICTION_COLUMNS} FROM predictions WHERE id = $1");
        execute_with_retry(&self.retry, "get_prediction", || {
            let sql = sql.as_str();
            async move {
                sqlx::query_as::<_, PredictionRecord>(sql)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(CoreError::from)
            }
        })
        .await
    }

    #[instrument(skip(self, link), fields(prediction_id = %link.prediction_id))]
    async fn link_prediction(&self, link: &NewMatchLink) -> Result<MatchLink> {
        let created = MatchLink::from_new(link);
        let mut tx = self.pool.begin().await?;

        // Flip first: an already processed or missing prediction aborts the link
        let flipped = sqlx::query(
            r#"
            UPDATE predictions
            SET processed = TRUE, pending_reason = NULL
            WHERE id = $1 AND processed = FALSE
            "#,
        )
        .bind(link.prediction_id)
        .execute(&mut *tx)
        .await?;

        if flipped.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(CoreError::NotFound(format!(
                "unprocessed prediction {}",
                link.prediction_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO match_links (
                id, prediction_id, match_external_id, home_confidence,
                away_confidence, overall_confidence, status, matched_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(created.id)
        .bind(created.prediction_id)
        .bind(&created.match_external_id)
        .bind(created.home_confidence)
        .bind(created.away_confidence)
        .bind(created.overall_confidence)
        .bind(created.status.as_str())
        .bind(created.matched_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn mark_pending(&self, prediction_id: Uuid, reason: &str) -> Result<()> {
        let result = execute_with_retry(&self.retry, "mark_pending", || async move {
            sqlx::query("UPDATE predictions SET pending_reason = $2 WHERE id = $1")
                .bind(prediction_id)
                .bind(reason)
                .execute(&self.pool)
                .await
                .map_err(CoreError::from)
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("prediction {}", prediction_id)));
        }
        Ok(())
    }

    async fn pending_predictions(&self, limit: usize) -> Result<Vec<PredictionRecord>> {
        let limit = limit as i64;
        let sql = format!(
            "SELECT {PREDICTION_COLUMNS} FROM predictions \
             WHERE processed = FALSE ORDER BY created_at LIMIT $1"
        );
        execute_with_retry(&self.retry, "pending_predictions", || {
            let sql = sql.as_str();
            async move {
                sqlx::query_as::<_, PredictionRecord>(sql)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(CoreError::from)
            }
        })
        .await
    }

    async fn unsettled_links(&self, limit: usize) -> Result<Vec<MatchLink>> {
        let limit = limit as i64;
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM match_links \
             WHERE outcome IS NULL ORDER BY matched_at LIMIT $1"
        );
        let rows = execute_with_retry(&self.retry, "unsettled_links", || {
            let sql = sql.as_str();
            async move {
                sqlx::query(sql)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(CoreError::from)
            }
        })
        .await?;

        rows.iter()
            .map(|row| link_from_row(row).map_err(CoreError::from))
            .collect()
    }

    async fn record_settlement(
        &self,
        link_id: Uuid,
        settlement: &SettlementResult,
        final_score: Option<&str>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE match_links
            SET outcome = $2,
                final_score = $3,
                settlement_rule = $4,
                settlement_reason = $5,
                settlement_snapshot = $6,
                resolved_at = NOW()
            WHERE id = $1 AND outcome IS NULL
            "#,
        )
        .bind(link_id)
        .bind(settlement.outcome.to_status())
        .bind(final_score)
        .bind(&settlement.rule)
        .bind(&settlement.reason)
        .bind(&settlement.snapshot)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("unsettled match link {}", link_id)));
        }
        Ok(())
    }
}
