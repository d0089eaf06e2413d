use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub pending_interval_secs: u64,
    pub pending_limit: usize,
    pub settle_interval_secs: u64,
    pub settle_limit: usize,
    pub run_migrations: bool,
    /// Run one pending pass and one settlement pass, then exit
    pub run_once: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            pending_interval_secs: parse_or("PENDING_INTERVAL_SECS", 60)?,
            pending_limit: parse_or("PENDING_BATCH_LIMIT", 100)?,
            settle_interval_secs: parse_or("SETTLE_INTERVAL_SECS", 300)?,
            settle_limit: parse_or("SETTLE_BATCH_LIMIT", 200)?,
            run_migrations: parse_or("RUN_MIGRATIONS", true)?,
            run_once: parse_or("RUN_ONCE", false)?,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_default_and_invalid() {
        assert_eq!(parse_or("PREDICTION_WORKER_TEST_UNSET", 42u64).unwrap(), 42);

        env::set_var("PREDICTION_WORKER_TEST_BAD", "soon");
        assert!(parse_or("PREDICTION_WORKER_TEST_BAD", 1u64).is_err());

        env::set_var("PREDICTION_WORKER_TEST_FLAG", " false ");
        assert!(!parse_or("PREDICTION_WORKER_TEST_FLAG", true).unwrap());
    }
}
