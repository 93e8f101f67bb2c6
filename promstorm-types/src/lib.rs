//! # promstorm-types
//!
//! Core types shared by the promstorm load generator. Nothing in this crate
//! performs I/O; it only describes *what* gets queried and *over which time
//! range*.
//!
//! ## Contents
//!
//! - [`TimeSpan`]: a signed span parsed from range expressions such as `30d`,
//!   `12h` or `1h30m`
//! - [`QueryWindow`]: the `(start, end, step)` triple a single range query runs over
//! - [`QueryTemplate`]: a query containing the `instance="host-0"` placeholder,
//!   rendered once per entity
//!
//! ## Example
//!
//! ```rust
//! use promstorm_types::{QueryTemplate, QueryWindow, TimeSpan};
//! use std::time::{Duration, SystemTime};
//!
//! let span: TimeSpan = "2d".parse().unwrap();
//! assert_eq!(span, "48h".parse().unwrap());
//!
//! let window = QueryWindow::ending_at(SystemTime::now(), span, Duration::from_secs(300));
//! assert_eq!(window.end_unix() - window.start_unix(), 48 * 3600);
//!
//! let template = QueryTemplate::new(r#"up{instance="host-0"}"#);
//! assert_eq!(template.render("db-1"), r#"up{instance="db-1"}"#);
//! ```

mod span;
mod template;
mod window;

pub use span::*;
pub use template::*;
pub use window::*;

/// An opaque identifier of one monitored entity, i.e. one value of the
/// enumerated label.
pub type EntityId = String;
