//! Paced batch execution
//!
//! Units run concurrently in groups of `batch_size` with `batch_pause`
//! between groups. A failing unit is logged and counted; the rest of the
//! batch carries on.

use crate::config::CoreConfig;
use crate::error::Result;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{error, info};

/// What happened to one successfully processed unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Linked,
    Pending,
    Settled,
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Units attempted, failed ones included
    pub processed: usize,
    pub linked: usize,
    pub pending: usize,
    pub settled: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, outcome: &Result<UnitOutcome>) {
        self.processed += 1;
        match outcome {
            Ok(UnitOutcome::Linked) => self.linked += 1,
            Ok(UnitOutcome::Pending) => self.pending += 1,
            Ok(UnitOutcome::Settled) => self.settled += 1,
            Ok(UnitOutcome::Skipped) => self.skipped += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Run `op` over `items` in paced groups, isolating per-unit failures
pub async fn run_batch<T, L, F, Fut>(
    items: Vec<T>,
    config: &CoreConfig,
    label: L,
    op: F,
) -> BatchReport
where
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<UnitOutcome>>,
{
    let mut report = BatchReport::default();
    if items.is_empty() {
        return report;
    }

    let total = items.len();
    let group_size = config.batch_size.max(1);
    let mut items = items.into_iter().peekable();

    loop {
        let group: Vec<(String, T)> = items
            .by_ref()
            .take(group_size)
            .map(|item| (label(&item), item))
            .collect();
        if group.is_empty() {
            break;
        }

        let (labels, units): (Vec<String>, Vec<T>) = group.into_iter().unzip();
        let results = join_all(units.into_iter().map(&op)).await;

        for (unit, result) in labels.iter().zip(results.iter()) {
            if let Err(e) = result {
                error!("Batch unit {} failed: {}", unit, e);
            }
            report.record(result);
        }

        if items.peek().is_some() && !config.batch_pause.is_zero() {
            tokio::time::sleep(config.batch_pause).await;
        }
    }

    info!(
        "Batch done: {}/{} processed, {} linked, {} pending, {} settled, {} skipped, {} failed",
        report.processed,
        total,
        report.linked,
        report.pending,
        report.settled,
        report.skipped,
        report.failed
    );
    report
}
