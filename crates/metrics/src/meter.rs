//! Throughput meter
//!
//! A monotonically increasing event counter with exponentially weighted
//! moving averages over 1, 5 and 15 minutes.
//!
//! `mark()` is a pair of relaxed atomic adds and never blocks. The moving
//! averages advance in fixed 5 second ticks, applied lazily the next time
//! someone takes a `snapshot()`, so the hot path never touches the lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Interval at which the moving averages are advanced
const TICK_INTERVAL: Duration = Duration::from_secs(5);

/// Point-in-time view of a `Meter`
///
/// Rates are events per second.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterSnapshot {
    pub count: u64,
    pub rate_1m: f64,
    pub rate_5m: f64,
    pub rate_15m: f64,
    pub mean_rate: f64,
}

#[derive(Debug)]
struct Ewma {
    alpha: f64,
    rate: f64,
    initialized: bool,
}

impl Ewma {
    fn over_minutes(minutes: f64) -> Self {
        Self {
            alpha: 1.0 - (-TICK_INTERVAL.as_secs_f64() / 60.0 / minutes).exp(),
            rate: 0.0,
            initialized: false,
        }
    }

    fn tick(&mut self, events: u64) {
        let instant_rate = events as f64 / TICK_INTERVAL.as_secs_f64();
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            self.rate = instant_rate;
            self.initialized = true;
        }
    }
}

#[derive(Debug)]
struct Averages {
    m1: Ewma,
    m5: Ewma,
    m15: Ewma,
    last_tick: Instant,
}

/// Throughput counter shared between the ingest loop and the reporter
#[derive(Debug)]
pub struct Meter {
    count: AtomicU64,
    /// Marks not yet folded into the moving averages
    uncounted: AtomicU64,
    started: Instant,
    averages: Mutex<Averages>,
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl Meter {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    fn started_at(started: Instant) -> Self {
        Self {
            count: AtomicU64::new(0),
            uncounted: AtomicU64::new(0),
            started,
            averages: Mutex::new(Averages {
                m1: Ewma::over_minutes(1.0),
                m5: Ewma::over_minutes(5.0),
                m15: Ewma::over_minutes(15.0),
                last_tick: started,
            }),
        }
    }

    /// Record `n` events
    #[inline]
    pub fn mark(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
        self.uncounted.fetch_add(n, Ordering::Relaxed);
    }

    /// Cumulative number of events since creation
    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Advance the moving averages and return the current view
    pub fn snapshot(&self) -> MeterSnapshot {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> MeterSnapshot {
        let mut averages = self.averages.lock();

        let elapsed = now.saturating_duration_since(averages.last_tick);
        let ticks = (elapsed.as_millis() / TICK_INTERVAL.as_millis()) as u32;
        if ticks > 0 {
            averages.last_tick += TICK_INTERVAL * ticks;

            // everything marked since the last advance lands in the first tick
            let mut pending = self.uncounted.swap(0, Ordering::Relaxed);
            for _ in 0..ticks {
                averages.m1.tick(pending);
                averages.m5.tick(pending);
                averages.m15.tick(pending);
                pending = 0;
            }
        }

        let count = self.count();
        let uptime = now.saturating_duration_since(self.started).as_secs_f64();
        let mean_rate = if uptime > 0.0 {
            count as f64 / uptime
        } else {
            0.0
        };

        MeterSnapshot {
            count,
            rate_1m: averages.m1.rate,
            rate_5m: averages.m5.rate,
            rate_15m: averages.m15.rate,
            mean_rate,
        }
    }
}
