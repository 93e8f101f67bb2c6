//! Query windows: the time range and resolution of one range query.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::TimeSpan;

/// The `(start, end, step)` triple a range query is evaluated over.
///
/// A window is computed once per round and shared by every query of that
/// round, so all workers hit the same time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    /// Start of the range.
    pub start: SystemTime,
    /// End of the range.
    pub end: SystemTime,
    /// Resolution step.
    pub step: Duration,
}

impl QueryWindow {
    /// Build a window that ends at `end` and reaches `span` into the past.
    ///
    /// A negative span puts `start` after `end`; the window is not normalized.
    pub fn ending_at(end: SystemTime, span: TimeSpan, step: Duration) -> Self {
        let start = if span.is_negative() {
            end + span.unsigned_abs()
        } else {
            end - span.unsigned_abs()
        };
        Self { start, end, step }
    }

    /// Build a window ending at the current wall-clock time.
    pub fn ending_now(span: TimeSpan, step: Duration) -> Self {
        Self::ending_at(SystemTime::now(), span, step)
    }

    /// Start as integer seconds since the Unix epoch.
    pub fn start_unix(&self) -> i64 {
        unix_seconds(self.start)
    }

    /// End as integer seconds since the Unix epoch.
    pub fn end_unix(&self) -> i64 {
        unix_seconds(self.end)
    }

    /// Step in whole seconds. Sub-second steps truncate, so `500ms` becomes `0`.
    pub fn step_secs(&self) -> u64 {
        self.step.as_secs()
    }
}

/// Seconds since the Unix epoch, rounded towards negative infinity.
fn unix_seconds(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(after) => after.as_secs() as i64,
        Err(err) => {
            let before = err.duration();
            let secs = before.as_secs() as i64;
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}
