//! # promstorm
//!
//! A periodic query load generator for Prometheus-compatible range query APIs.
//!
//! At startup the values of one label (by default `instance`) are enumerated
//! once; each becomes an *entity*. Every tick of a fixed interval starts a
//! *round*: a pool of workers each substitutes every entity into every query
//! template and issues the resulting range query over a window ending at the
//! tick time. Results are discarded; only success or failure is recorded.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────────┐   ┌──────────────────────────┐
//! │ templates    │──▶│                │   │ promstorm-client         │
//! │ (file)       │   │   scheduler    │──▶│  PrometheusClient        │
//! ├──────────────┤   │ (ticks/rounds/ │   │  (QueryExecutor)         │
//! │ label values │──▶│    workers)    │   └──────────────────────────┘
//! │ (entities)   │   └────────────────┘
//! └──────────────┘
//! ```
//!
//! - **[`config`]**: command-line flags layered over defaults, a config file
//!   and `PROMSTORM_*` environment variables
//! - **[`templates`]**: loading query templates from disk
//! - **[`scheduler`]**: tick sources, rounds and workers
//! - **[`executor`]**: the [`QueryExecutor`] seam between workers and HTTP
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! promstorm --prom-url http://localhost:9090 --query-file queries.txt \
//!     --range 7d --step 5m --ticker 10s --num-threads 4
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use promstorm::{load_templates, ManualTicker, Scheduler, TimeSpan, Workload};
//! use promstorm_client::PrometheusClient;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PrometheusClient::builder()
//!     .endpoint("http://localhost:9090")
//!     .build()?;
//! let entities = client.label_values("instance").await?;
//! let templates = load_templates("queries.txt")?;
//!
//! let workload = Workload::new(templates, entities).workers(2);
//! let scheduler = Scheduler::new(
//!     workload,
//!     Arc::new(client),
//!     TimeSpan::from_hours(24),
//!     Duration::from_secs(300),
//! );
//!
//! // Drive exactly three rounds.
//! scheduler.run(ManualTicker::with_ticks(3)).await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod executor;
pub mod logging;
pub mod scheduler;
pub mod templates;

pub use config::{Cli, Command, ConfigError, Settings};
pub use executor::QueryExecutor;
pub use promstorm_types::{EntityId, QueryTemplate, QueryWindow, TimeSpan};
pub use scheduler::{
    IntervalTicker, ManualTicker, Round, RoundReport, Scheduler, TickSource, WorkerReport,
    Workload,
};
pub use templates::{load_templates, parse_templates, TemplateError};
