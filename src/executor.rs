//! The seam between workers and the query API.

use std::fmt::Debug;

use async_trait::async_trait;
use promstorm_client::{ClientError, PrometheusClient};
use promstorm_types::QueryWindow;

/// Executes one concrete range query.
///
/// Workers only care whether a query succeeded; results are never returned.
/// [`PrometheusClient`] is the production implementation; tests substitute
/// counting or failing executors.
#[async_trait]
pub trait QueryExecutor: Send + Sync + Debug {
    /// Run `query` over `window`.
    async fn execute(&self, query: &str, window: &QueryWindow) -> Result<(), ClientError>;
}

#[async_trait]
impl QueryExecutor for PrometheusClient {
    async fn execute(&self, query: &str, window: &QueryWindow) -> Result<(), ClientError> {
        self.query_range(query, window).await
    }
}
