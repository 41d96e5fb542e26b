//! Rate-limit pacing
//!
//! A [`Pacer`] belongs to exactly one traversal, so concurrent traversals
//! never share a counter.

use crate::config::CrawlerConfig;
use rand::Rng;
use std::time::Duration;

/// Pauses a traversal after every `interval` emitted comments
#[derive(Debug, Clone)]
pub struct Pacer {
    interval: u64,
    min_delay: Duration,
    max_delay: Duration,
    emitted: u64,
}

impl Pacer {
    /// Creates a pacer; the pause is drawn uniformly from `[min_delay, max_delay]`
    pub fn new(interval: u64, min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            interval: interval.max(1),
            min_delay,
            max_delay: max_delay.max(min_delay),
            emitted: 0,
        }
    }

    /// Creates a pacer from the crawler configuration
    pub fn from_config(config: &CrawlerConfig) -> Self {
        let (min_delay, max_delay) = config.pacing_delay_range();
        Self::new(config.pacing_interval, min_delay, max_delay)
    }

    /// Comments recorded so far
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Records one emitted comment and returns the pause now due, if any
    pub fn record(&mut self) -> Option<Duration> {
        self.emitted += 1;
        if self.emitted % self.interval != 0 {
            return None;
        }

        if self.min_delay == self.max_delay {
            Some(self.min_delay)
        } else {
            Some(rand::thread_rng().gen_range(self.min_delay..=self.max_delay))
        }
    }

    /// Records one emitted comment and sleeps if a pause is due
    ///
    /// Returns true if the traversal was paused.
    pub async fn tick(&mut self) -> bool {
        match self.record() {
            Some(delay) => {
                tracing::info!(
                    "Collected {} comments, pausing {:.2}s",
                    self.emitted,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                true
            }
            None => false,
        }
    }
}
