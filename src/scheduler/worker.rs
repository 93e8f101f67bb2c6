//! A single worker's walk over the entity × template product.

use std::sync::Arc;

use promstorm_types::QueryWindow;
use tracing::{debug, warn};

use super::Workload;
use crate::executor::QueryExecutor;

/// Per-worker tallies for one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    /// Queries issued.
    pub attempted: usize,
    /// Queries that returned an error.
    pub failed: usize,
}

/// One worker of one round.
#[derive(Debug)]
pub(crate) struct Worker {
    pub(crate) index: usize,
    pub(crate) round: u64,
    pub(crate) window: QueryWindow,
    pub(crate) workload: Workload,
    pub(crate) executor: Arc<dyn QueryExecutor>,
}

impl Worker {
    /// Walk every entity in order, and for each entity every template in
    /// order, then pause for the entity delay.
    ///
    /// Failures are logged and skipped; nothing aborts the walk.
    pub(crate) async fn run(self) -> WorkerReport {
        let mut report = WorkerReport::default();

        for (entity_index, entity) in self.workload.entities.iter().enumerate() {
            for template in self.workload.templates.iter() {
                let query = template.render(entity);
                report.attempted += 1;

                match self.executor.execute(&query, &self.window).await {
                    Ok(()) => {
                        debug!(round = self.round, worker = self.index, %entity, %query, "query ok");
                    }
                    Err(err) => {
                        report.failed += 1;
                        warn!(
                            round = self.round,
                            worker = self.index,
                            entity_index,
                            %entity,
                            %query,
                            error = %err,
                            "query failed"
                        );
                    }
                }
            }

            tokio::time::sleep(self.workload.entity_delay).await;
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::testing::RecordingExecutor;
    use promstorm_types::{QueryTemplate, TimeSpan};
    use std::time::Duration;
    use tokio::time::Instant;

    fn window() -> QueryWindow {
        QueryWindow::ending_now(TimeSpan::from_hours(1), Duration::from_secs(60))
    }

    fn worker(workload: Workload, executor: Arc<RecordingExecutor>) -> Worker {
        Worker {
            index: 0,
            round: 1,
            window: window(),
            workload,
            executor,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_walks_entities_outer_templates_inner() {
        let workload = Workload::new(
            vec![
                QueryTemplate::new(r#"a{instance="host-0"}"#),
                QueryTemplate::new(r#"b{instance="host-0"}"#),
            ],
            vec!["x".to_string(), "y".to_string()],
        );
        let executor = Arc::new(RecordingExecutor::default());

        let report = worker(workload, executor.clone()).run().await;

        assert_eq!(report, WorkerReport { attempted: 4, failed: 0 });
        assert_eq!(
            executor.queries(),
            vec![
                r#"a{instance="x"}"#,
                r#"b{instance="x"}"#,
                r#"a{instance="y"}"#,
                r#"b{instance="y"}"#,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparametrized_template_repeats_per_entity() {
        let workload = Workload::new(
            vec![QueryTemplate::new("sum(up)")],
            vec!["x".to_string(), "y".to_string(), "z".to_string()],
        );
        let executor = Arc::new(RecordingExecutor::default());

        worker(workload, executor.clone()).run().await;

        assert_eq!(executor.queries(), vec!["sum(up)"; 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_the_walk() {
        let workload = Workload::new(
            vec![QueryTemplate::new("q1"), QueryTemplate::new("q2")],
            vec!["x".to_string(), "y".to_string()],
        );
        let executor = Arc::new(RecordingExecutor::failing_on(&[1]));

        let report = worker(workload, executor.clone()).run().await;

        assert_eq!(report, WorkerReport { attempted: 4, failed: 1 });
        assert_eq!(executor.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_query_failing_still_completes() {
        let workload = Workload::new(
            vec![QueryTemplate::new("q1"), QueryTemplate::new("q2")],
            vec!["x".to_string()],
        );
        let executor = Arc::new(RecordingExecutor::failing_on(&[0, 1]));

        let report = worker(workload, executor).run().await;
        assert_eq!(report, WorkerReport { attempted: 2, failed: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_applies_once_per_entity() {
        let workload = Workload::new(
            vec![QueryTemplate::new("q1"), QueryTemplate::new("q2"), QueryTemplate::new("q3")],
            vec!["x".to_string(), "y".to_string()],
        )
        .entity_delay(Duration::from_millis(250));
        let executor = Arc::new(RecordingExecutor::default());

        let start = Instant::now();
        worker(workload, executor).run().await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(500), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(750), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_queries_share_the_window() {
        let workload = Workload::new(
            vec![QueryTemplate::new("q1")],
            vec!["x".to_string(), "y".to_string()],
        )
        .entity_delay(Duration::from_secs(3));
        let executor = Arc::new(RecordingExecutor::default());
        let worker = worker(workload, executor.clone());
        let expected = worker.window;

        worker.run().await;

        assert!(executor.windows().iter().all(|w| *w == expected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_entities_means_no_queries() {
        let workload = Workload::new(vec![QueryTemplate::new("q1")], Vec::new());
        let executor = Arc::new(RecordingExecutor::default());

        let report = worker(workload, executor.clone()).run().await;
        assert_eq!(report, WorkerReport::default());
        assert_eq!(executor.calls(), 0);
    }
}
