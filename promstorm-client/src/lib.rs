//! # promstorm-client
//!
//! A deliberately small client for the two Prometheus HTTP API endpoints the
//! load generator needs:
//!
//! - `GET /api/v1/label/<name>/values` to enumerate entities once at startup
//! - `GET /api/v1/query_range` to issue the synthetic load
//!
//! Responses are decoded only far enough to tell success from failure; query
//! results are discarded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use promstorm_client::PrometheusClient;
//! use promstorm_types::{QueryWindow, TimeSpan};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PrometheusClient::builder()
//!         .endpoint("http://localhost:9090")
//!         .bearer_token("s3cr3t")
//!         .build()?;
//!
//!     let instances = client.label_values("instance").await?;
//!     println!("Found {} instances", instances.len());
//!
//!     let window = QueryWindow::ending_now(TimeSpan::from_hours(1), Duration::from_secs(60));
//!     client.query_range(r#"up{instance="host-0"}"#, &window).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod prometheus;

pub use error::ClientError;
pub use prometheus::{
    LabelValuesResponse, PrometheusClient, PrometheusClientBuilder, RangeQueryData,
    RangeQueryResponse,
};

// Re-export types for convenience
pub use promstorm_types::QueryWindow;
