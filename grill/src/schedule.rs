use std::thread;
use std::time::{Duration, Instant};

/// Wakes up at a fixed period without drifting.
///
/// Each wake-up time is the previous *scheduled* wake-up plus the period, so time spent working
/// between waits doesn't push the following cycles back. A cycle that overruns its deadline
/// makes the next wait return immediately.
#[derive(Debug)]
pub struct PeriodicSchedule {
    period: Duration,
    next_wake: Instant,
}

impl PeriodicSchedule {
    pub fn new(period: Duration) -> Self {
        Self::starting_at(Instant::now(), period)
    }

    pub fn starting_at(start: Instant, period: Duration) -> Self {
        PeriodicSchedule {
            period,
            next_wake: start + period,
        }
    }

    pub fn next_wake(&self) -> Instant {
        self.next_wake
    }

    /// Returns how long to sleep from `now` until the next wake-up and moves on to the one after.
    pub fn advance(&mut self, now: Instant) -> Duration {
        let sleep = self.next_wake.saturating_duration_since(now);
        self.next_wake += self.period;
        sleep
    }

    /// Sleeps until the next wake-up.
    pub fn wait(&mut self) {
        let sleep = self.advance(Instant::now());
        if !sleep.is_zero() {
            thread::sleep(sleep);
        }
    }
}
