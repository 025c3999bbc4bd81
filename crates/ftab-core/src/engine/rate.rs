use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::error::FtabError;

/// Shared request-rate gate for benchmark workers.
///
/// A background task tops the permit pool up on a fixed tick so that at most
/// `per_second` permits are handed out per second, spread evenly. The task
/// stops when the gate is dropped.
pub struct RateGate {
    permits: Arc<Semaphore>,
    refill: JoinHandle<()>,
}

impl RateGate {
    /// Must be called inside a Tokio runtime.
    pub fn new(per_second: u64) -> Self {
        let mut refill = Refill::new(per_second);
        let burst = refill.burst();
        let permits = Arc::new(Semaphore::new(burst));

        let pool = Arc::clone(&permits);
        let task = tokio::spawn(async move {
            let mut ticker = interval(refill.tick);
            // The first tick completes immediately; the pool already starts full.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let batch = refill.next_batch();
                let available = pool.available_permits();
                if available < burst {
                    pool.add_permits(batch.min(burst - available));
                }
            }
        });

        Self {
            permits,
            refill: task,
        }
    }

    /// Wait for the next slot.
    pub async fn acquire(&self) -> Result<(), FtabError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FtabError::Engine("rate gate closed".to_string()))?;
        permit.forget();
        Ok(())
    }
}

impl Drop for RateGate {
    fn drop(&mut self) {
        self.refill.abort();
    }
}

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Refill schedule for a rate. Ticks never go below one millisecond; the
/// fractional permit of each tick is carried into the next one so the long
/// run average is exactly `per_second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Refill {
    tick: Duration,
    per_second: u64,
    remainder: u128,
}

impl Refill {
    fn new(per_second: u64) -> Self {
        let per_second = per_second.max(1);
        let tick = Duration::from_nanos(1_000_000_000 / per_second).max(Duration::from_millis(1));
        Self {
            tick,
            per_second,
            remainder: 0,
        }
    }

    /// Permits due at the next tick.
    fn next_batch(&mut self) -> usize {
        let due = u128::from(self.per_second) * self.tick.as_nanos() + self.remainder;
        self.remainder = due % NANOS_PER_SEC;
        usize::try_from(due / NANOS_PER_SEC).unwrap_or(usize::MAX)
    }

    /// Most permits one tick can hand out; the pool never holds more.
    fn burst(&self) -> usize {
        let per_tick = (u128::from(self.per_second) * self.tick.as_nanos()).div_ceil(NANOS_PER_SEC);
        usize::try_from(per_tick.max(1)).unwrap_or(usize::MAX)
    }
}
