//! The tick-driven round scheduler.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ tick ┌───────────────────────────────────────────────┐
//! │  TickSource  │─────▶│ Scheduler                                     │
//! │ (Interval /  │      │  window = (now - range, now, step)            │
//! │  Manual)     │      │  Round::run ──spawn──▶ Worker 0..N            │
//! └──────────────┘      │             ◀──join───  (entities × templates)│
//!                       │  log RoundReport, wait for next tick          │
//!                       └───────────────────────────────────────────────┘
//! ```
//!
//! Rounds never overlap: the next tick is only awaited once every worker of
//! the current round has returned. A slow round stretches the cadence
//! instead of stacking rounds on top of each other.

mod round;
mod ticker;
mod worker;

pub use round::{Round, RoundReport};
pub use ticker::{IntervalTicker, ManualTicker, TickSource};
pub use worker::WorkerReport;

use std::sync::Arc;
use std::time::Duration;

use promstorm_types::{EntityId, QueryTemplate, QueryWindow, TimeSpan};
use tracing::{info, warn};

use crate::executor::QueryExecutor;

/// The parts of a round that stay fixed for the whole run.
///
/// Cloning is cheap; the template and entity lists are shared read-only
/// between all workers of all rounds.
#[derive(Debug, Clone)]
pub struct Workload {
    /// Query templates, in file order.
    pub templates: Arc<[QueryTemplate]>,
    /// Entities to substitute, in enumeration order.
    pub entities: Arc<[EntityId]>,
    /// Workers per round. Each one runs the full product.
    pub workers: usize,
    /// Pause after each entity's templates.
    pub entity_delay: Duration,
}

impl Workload {
    /// Create a workload with one worker and no entity delay.
    pub fn new(templates: Vec<QueryTemplate>, entities: Vec<EntityId>) -> Self {
        Self {
            templates: templates.into(),
            entities: entities.into(),
            workers: 1,
            entity_delay: Duration::ZERO,
        }
    }

    /// Set the number of workers per round.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the pause between entities.
    pub fn entity_delay(mut self, delay: Duration) -> Self {
        self.entity_delay = delay;
        self
    }

    /// Queries issued by one complete round.
    pub fn queries_per_round(&self) -> usize {
        self.workers * self.entities.len() * self.templates.len()
    }
}

/// Drives rounds from a [`TickSource`].
#[derive(Debug)]
pub struct Scheduler {
    workload: Workload,
    executor: Arc<dyn QueryExecutor>,
    range: TimeSpan,
    step: Duration,
}

impl Scheduler {
    /// Create a scheduler.
    ///
    /// `range` is how far back each window reaches from the tick time and
    /// `step` is the query resolution.
    pub fn new(
        workload: Workload,
        executor: Arc<dyn QueryExecutor>,
        range: TimeSpan,
        step: Duration,
    ) -> Self {
        Self {
            workload,
            executor,
            range,
            step,
        }
    }

    /// The fixed workload.
    pub fn workload(&self) -> &Workload {
        &self.workload
    }

    /// Build round `number` with a window ending now.
    pub fn round(&self, number: u64) -> Round {
        Round::new(
            number,
            QueryWindow::ending_now(self.range, self.step),
            self.workload.clone(),
            self.executor.clone(),
        )
    }

    /// Run one round per tick until the tick source is exhausted.
    ///
    /// With an [`IntervalTicker`] this never returns. Returns the number of
    /// rounds completed.
    pub async fn run<T: TickSource>(&self, mut ticker: T) -> u64 {
        let period = ticker.period();
        let mut completed = 0;

        while ticker.tick().await.is_some() {
            let report = self.round(completed + 1).run().await;
            log_report(&report, period);
            completed += 1;
        }

        completed
    }
}

fn log_report(report: &RoundReport, period: Option<Duration>) {
    info!(
        round = report.number,
        workers = report.workers,
        attempted = report.attempted,
        failed = report.failed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "round complete"
    );

    if let Some(period) = period.filter(|period| report.elapsed > *period) {
        warn!(
            round = report.number,
            elapsed_ms = report.elapsed.as_millis() as u64,
            interval_ms = period.as_millis() as u64,
            "round overran the tick interval; the next round starts late"
        );
    }
}
