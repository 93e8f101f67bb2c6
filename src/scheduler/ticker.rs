//! Tick sources that drive rounds.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// A source of scheduling ticks.
///
/// The scheduler starts one round per tick and does not ask for the next
/// tick until the round has finished.
#[async_trait]
pub trait TickSource: Send {
    /// Wait for the next tick. `None` means the source is exhausted.
    async fn tick(&mut self) -> Option<Instant>;

    /// The nominal interval between ticks, if there is one.
    fn period(&self) -> Option<Duration> {
        None
    }
}

/// Fixed-interval ticker backed by a tokio [`Interval`].
///
/// The first tick fires one full period after creation. When a round
/// overruns the period, at most one late tick fires immediately and the
/// schedule then realigns to the period grid, so rounds never queue up.
#[derive(Debug)]
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    /// Create a ticker with the given period.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl TickSource for IntervalTicker {
    async fn tick(&mut self) -> Option<Instant> {
        Some(self.interval.tick().await)
    }

    fn period(&self) -> Option<Duration> {
        Some(self.interval.period())
    }
}

/// A ticker fired by hand through a channel.
///
/// Useful for driving rounds from tests or from an embedding application.
/// The ticker is exhausted once every sender is dropped and all pending
/// ticks are consumed.
///
/// # Example
///
/// ```
/// use promstorm::ManualTicker;
///
/// let (trigger, ticker) = ManualTicker::create();
/// trigger.send(()).unwrap();
/// ```
#[derive(Debug)]
pub struct ManualTicker {
    receiver: mpsc::UnboundedReceiver<()>,
}

impl ManualTicker {
    /// Create a ticker and the sender that fires it.
    pub fn create() -> (mpsc::UnboundedSender<()>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { receiver: rx })
    }

    /// A ticker that fires `count` times and is then exhausted.
    pub fn with_ticks(count: usize) -> Self {
        let (tx, ticker) = Self::create();
        for _ in 0..count {
            // The receiver is alive in `ticker`, so sending cannot fail.
            let _ = tx.send(());
        }
        ticker
    }
}

#[async_trait]
impl TickSource for ManualTicker {
    async fn tick(&mut self) -> Option<Instant> {
        self.receiver.recv().await.map(|()| Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_interval_first_tick_after_one_period() {
        let start = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::from_secs(5));

        let first = ticker.tick().await.unwrap();
        assert_eq!(first - start, Duration::from_secs(5));

        let second = ticker.tick().await.unwrap();
        assert_eq!(second - start, Duration::from_secs(10));
        assert_eq!(ticker.period(), Some(Duration::from_secs(5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_skips_missed_ticks() {
        let start = Instant::now();
        let mut ticker = IntervalTicker::new(Duration::from_secs(5));

        ticker.tick().await.unwrap();
        // A round that takes 12s: ticks at 10s and 15s are missed.
        time::sleep(Duration::from_secs(12)).await;

        // The overdue tick fires right away instead of queueing a backlog.
        let before = Instant::now();
        ticker.tick().await.unwrap();
        assert!(Instant::now() - before < Duration::from_millis(5));

        // Then the schedule realigns to the 5s grid.
        let third = ticker.tick().await.unwrap();
        assert_eq!(third - start, Duration::from_secs(20));
    }

    #[tokio::test]
    async fn test_manual_ticker_fires_then_exhausts() {
        let mut ticker = ManualTicker::with_ticks(2);
        assert!(ticker.tick().await.is_some());
        assert!(ticker.tick().await.is_some());
        assert!(ticker.tick().await.is_none());
        assert_eq!(ticker.period(), None);
    }

    #[tokio::test]
    async fn test_manual_ticker_follows_sender() {
        let (trigger, mut ticker) = ManualTicker::create();
        trigger.send(()).unwrap();
        assert!(ticker.tick().await.is_some());

        drop(trigger);
        assert!(ticker.tick().await.is_none());
    }
}
