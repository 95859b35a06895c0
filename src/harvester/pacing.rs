//! Randomized pauses between remote interactions

use crate::config::DelayRange;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Mutex;
use std::time::Duration;

/// Suspends the caller between remote interactions
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits for a duration drawn from `range`
    async fn pause(&self, range: DelayRange);
}

/// Draws a delay uniformly from `range`, inclusive on both ends
///
/// A reversed range is treated as if its bounds were swapped.
pub fn pick_delay<R: Rng + ?Sized>(range: DelayRange, rng: &mut R) -> Duration {
    let (low, high) = if range.min_ms <= range.max_ms {
        (range.min_ms, range.max_ms)
    } else {
        (range.max_ms, range.min_ms)
    };
    Duration::from_millis(rng.gen_range(low..=high))
}

/// Sleeps for real, at a human cadence
#[derive(Debug, Default, Clone, Copy)]
pub struct HumanPacer;

#[async_trait]
impl Pacer for HumanPacer {
    async fn pause(&self, range: DelayRange) {
        let delay = pick_delay(range, &mut rand::thread_rng());
        tracing::trace!("Pausing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}

/// Returns immediately, remembering every range it was asked for
#[derive(Debug, Default)]
pub struct InstantPacer {
    requested: Mutex<Vec<DelayRange>>,
}

impl InstantPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ranges requested so far, in order
    pub fn requested(&self) -> Vec<DelayRange> {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of pauses requested with exactly `range`
    pub fn count_of(&self, range: DelayRange) -> usize {
        self.requested().iter().filter(|r| **r == range).count()
    }
}

#[async_trait]
impl Pacer for InstantPacer {
    async fn pause(&self, range: DelayRange) {
        self.requested
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(range);
    }
}
