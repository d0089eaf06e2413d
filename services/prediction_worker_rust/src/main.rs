mod config;

use crate::config::Config;
use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tipmatch_rust_core::db::{
    check_pool_health, create_pool, migrate, DbPoolConfig, PgMatchRegistry, PgPredictionStore,
    PgTeamRegistry, PoolStats, RetryPolicy,
};
use tipmatch_rust_core::{CoreConfig, Engine};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!("Starting prediction worker...");

    let config = Config::from_env()?;
    let core_config = CoreConfig::from_env();
    info!(
        "Confidence floor {:.2}, batch size {}, batch pause {:?}",
        core_config.confidence_floor, core_config.batch_size, core_config.batch_pause
    );

    // Database
    let pool = create_pool(&config.database_url, &DbPoolConfig::from_env())
        .await
        .context("Failed to connect to database")?;
    check_pool_health(&pool)
        .await
        .context("Database health check failed")?;
    if config.run_migrations {
        migrate(&pool).await.context("Failed to run migrations")?;
    }

    let retry = RetryPolicy::from_env();
    let engine = Arc::new(Engine::new(
        Arc::new(PgTeamRegistry::new(pool.clone(), retry.clone())),
        Arc::new(PgMatchRegistry::new(pool.clone(), retry.clone())),
        Arc::new(PgPredictionStore::new(pool.clone(), retry)),
        core_config,
    ));

    if config.run_once {
        run_pending_cycle(&engine, config.pending_limit).await;
        run_settle_cycle(&engine, config.settle_limit).await;
        return Ok(());
    }

    let mut tasks = Vec::new();

    // 1. Pending re-resolution loop
    let pending_engine = engine.clone();
    let pending_interval = config.pending_interval_secs;
    let pending_limit = config.pending_limit;
    tasks.push(tokio::spawn(async move {
        info!("Pending loop started (interval: {}s)", pending_interval);
        loop {
            run_pending_cycle(&pending_engine, pending_limit).await;
            tokio::time::sleep(Duration::from_secs(pending_interval)).await;
        }
    }));

    // 2. Settlement loop
    let settle_engine = engine.clone();
    let settle_interval = config.settle_interval_secs;
    let settle_limit = config.settle_limit;
    tasks.push(tokio::spawn(async move {
        info!("Settlement loop started (interval: {}s)", settle_interval);
        loop {
            run_settle_cycle(&settle_engine, settle_limit).await;
            tokio::time::sleep(Duration::from_secs(settle_interval)).await;
        }
    }));

    // 3. Pool monitor
    let monitor_pool = pool.clone();
    tasks.push(tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            let stats = PoolStats::of(&monitor_pool);
            info!(
                "Pool: {} connections, {} active, {} idle",
                stats.size,
                stats.active(),
                stats.idle
            );
        }
    }));

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }

    for task in tasks {
        task.abort();
    }
    pool.close().await;

    Ok(())
}

async fn run_pending_cycle(engine: &Engine, limit: usize) {
    match engine.ingestor.process_pending(limit).await {
        Ok(report) => log_report("pending", &report),
        Err(e) => error!("Pending cycle failed: {}", e),
    }
}

async fn run_settle_cycle(engine: &Engine, limit: usize) {
    match engine.settler.settle_pending(limit).await {
        Ok(report) => log_report("settlement", &report),
        Err(e) => error!("Settlement cycle failed: {}", e),
    }
}

fn log_report(cycle: &str, report: &tipmatch_rust_core::BatchReport) {
    if report.processed == 0 {
        return;
    }
    match serde_json::to_string(report) {
        Ok(json) => info!("{} cycle report: {}", cycle, json),
        Err(e) => error!("Failed to serialize {} report: {}", cycle, e),
    }
}
