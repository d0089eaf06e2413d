use super::retry::{execute_with_retry, RetryPolicy};
use crate::error::{CoreError, Result};
use crate::models::TeamRecord;
use crate::registry::{escape_like, NamePattern, TeamRegistry};
use async_trait::async_trait;
use sqlx::PgPool;

/// Team registry backed by the `teams` and `team_aliases` tables
#[derive(Clone)]
pub struct PgTeamRegistry {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgTeamRegistry {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self::new(pool, RetryPolicy::default())
    }

    async fn fetch_teams(
        &self,
        operation: &str,
        sql: &str,
        patterns: &[String],
        limit: usize,
    ) -> Result<Vec<TeamRecord>> {
        let limit = limit as i64;
        execute_with_retry(&self.retry, operation, || async move {
            sqlx::query_as::<_, TeamRecord>(sql)
                .bind(patterns.to_vec())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
                .map_err(CoreError::from)
        })
        .await
    }
}

#[async_trait]
impl TeamRegistry for PgTeamRegistry {
    async fn find_by_name(&self, name: &str) -> Result<Option<TeamRecord>> {
        let name = name.trim();
        execute_with_retry(&self.retry, "find_by_name", || async move {
            sqlx::query_as::<_, TeamRecord>(
                r#"
                SELECT id, name, short_name
                FROM teams
                WHERE lower(name) = lower($1) OR lower(short_name) = lower($1)
                ORDER BY (lower(name) = lower($1)) DESC, id
                LIMIT 1
                "#,
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::from)
        })
        .await
    }

    async fn find_by_alias(&self, alias: &str) -> Result<Option<TeamRecord>> {
        let alias = alias.trim();
        execute_with_retry(&self.retry, "find_by_alias", || async move {
            sqlx::query_as::<_, TeamRecord>(
                r#"
                SELECT t.id, t.name, t.short_name
                FROM team_aliases ta
                JOIN teams t ON t.id = ta.team_id
                WHERE lower(ta.alias) = lower($1)
                LIMIT 1
                "#,
            )
            .bind(alias)
            .fetch_optional(&self.pool)
            .await
            .map_err(CoreError::from)
        })
        .await
    }

    async fn search_by_tokens(&self, tokens: &[String], limit: usize) -> Result<Vec<TeamRecord>> {
        let patterns: Vec<String> = tokens
            .iter()
            .map(|t| format!("%{}%", escape_like(t)))
            .collect();
        self.fetch_teams(
            "search_by_tokens",
            r#"
            SELECT id, name, short_name
            FROM teams
            WHERE name ILIKE ALL($1::text[])
            ORDER BY id
            LIMIT $2
            "#,
            &patterns,
            limit,
        )
        .await
    }

    async fn search_by_patterns(
        &self,
        patterns: &[NamePattern],
        limit: usize,
    ) -> Result<Vec<TeamRecord>> {
        let likes: Vec<String> = patterns.iter().map(NamePattern::to_like).collect();
        self.fetch_teams(
            "search_by_patterns",
            r#"
            SELECT id, name, short_name
            FROM teams
            WHERE name ILIKE ANY($1::text[]) OR short_name ILIKE ANY($1::text[])
            ORDER BY id
            LIMIT $2
            "#,
            &likes,
            limit,
        )
        .await
    }

    async fn scan(&self, limit: usize) -> Result<Vec<TeamRecord>> {
        let limit = limit as i64;
        execute_with_retry(&self.retry, "scan", || async move {
            sqlx::query_as::<_, TeamRecord>(
                "SELECT id, name, short_name FROM teams ORDER BY id LIMIT $1",
            )
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(CoreError::from)
        })
        .await
    }
}
