//! One round: fan out the workers, wait for all of them.

use std::sync::Arc;
use std::time::Duration;

use promstorm_types::QueryWindow;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error};

use super::worker::Worker;
use super::Workload;
use crate::executor::QueryExecutor;

/// A single round of work, bound to one query window.
#[derive(Debug)]
pub struct Round {
    number: u64,
    window: QueryWindow,
    workload: Workload,
    executor: Arc<dyn QueryExecutor>,
}

impl Round {
    /// Create a round.
    pub fn new(
        number: u64,
        window: QueryWindow,
        workload: Workload,
        executor: Arc<dyn QueryExecutor>,
    ) -> Self {
        Self {
            number,
            window,
            workload,
            executor,
        }
    }

    /// The round's sequence number (the first round is 1).
    pub fn number(&self) -> u64 {
        self.number
    }

    /// The window every query of this round uses.
    pub fn window(&self) -> &QueryWindow {
        &self.window
    }

    /// Spawn one task per worker and wait until every one of them is done.
    ///
    /// Every worker runs the full entity × template product; work is not
    /// split between them. A worker that panics is counted and logged, and
    /// the round still completes.
    pub async fn run(self) -> RoundReport {
        let started = Instant::now();
        let workers = self.workload.workers;

        debug!(round = self.number, workers, "starting round");

        let mut tasks = JoinSet::new();
        for index in 0..workers {
            let worker = Worker {
                index,
                round: self.number,
                window: self.window,
                workload: self.workload.clone(),
                executor: self.executor.clone(),
            };
            tasks.spawn(worker.run());
        }

        let mut report = RoundReport {
            number: self.number,
            window: self.window,
            workers,
            attempted: 0,
            failed: 0,
            crashed_workers: 0,
            elapsed: Duration::ZERO,
        };

        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(worker) => {
                    report.attempted += worker.attempted;
                    report.failed += worker.failed;
                }
                Err(err) => {
                    report.crashed_workers += 1;
                    error!(round = self.number, error = %err, "worker task failed");
                }
            }
        }

        report.elapsed = started.elapsed();
        report
    }
}

/// Summary of a finished round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundReport {
    /// Round sequence number.
    pub number: u64,
    /// Window the round queried.
    pub window: QueryWindow,
    /// Workers launched.
    pub workers: usize,
    /// Queries issued across all workers.
    pub attempted: usize,
    /// Queries that failed.
    pub failed: usize,
    /// Worker tasks that panicked.
    pub crashed_workers: usize,
    /// Time from launch until the last worker finished.
    pub elapsed: Duration,
}

impl RoundReport {
    /// Queries that succeeded.
    pub fn succeeded(&self) -> usize {
        self.attempted - self.failed
    }
}
