//! Time sources for the capture pipeline.
//!
//! The pipeline needs two clocks per chunk: a monotonic [`Instant`] for the
//! silence timeout and a wall-clock [`DateTime`] for file names.
//! [`SystemClock`] reads both live; [`SteppingClock`] advances by a fixed
//! step per call, which is how file replay and tests drive the pipeline at
//! audio time instead of real time.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, TimeDelta};

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A monotonic instant paired with the wall-clock time it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    pub instant: Instant,
    pub wall: DateTime<Local>,
}

impl Timestamp {
    pub fn now() -> Self {
        Self {
            instant: Instant::now(),
            wall: Local::now(),
        }
    }

    /// This timestamp moved forward by `step` on both clocks.
    pub fn advanced_by(self, step: Duration) -> Self {
        let wall = TimeDelta::from_std(step)
            .ok()
            .and_then(|delta| self.wall.checked_add_signed(delta))
            .unwrap_or(self.wall);
        Self {
            instant: self.instant + step,
            wall,
        }
    }
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Supplies the timestamp for each chunk as it is read.
pub trait Clock {
    fn now(&mut self) -> Timestamp;
}

/// Live system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Timestamp {
        Timestamp::now()
    }
}

/// Returns `start`, then `start + step`, `start + 2·step`, …
#[derive(Debug, Clone)]
pub struct SteppingClock {
    next: Timestamp,
    step: Duration,
}

impl SteppingClock {
    pub fn new(start: Timestamp, step: Duration) -> Self {
        Self { next: start, step }
    }
}

impl Clock for SteppingClock {
    fn now(&mut self) -> Timestamp {
        let current = self.next;
        self.next = current.advanced_by(self.step);
        current
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_clock_advances_both_clocks() {
        let start = Timestamp::now();
        let mut clock = SteppingClock::new(start, Duration::from_millis(500));

        assert_eq!(clock.now(), start);
        let second = clock.now();
        assert_eq!(second.instant - start.instant, Duration::from_millis(500));
        assert_eq!(second.wall - start.wall, TimeDelta::milliseconds(500));
    }

    #[test]
    fn system_clock_is_monotonic() {
        let mut clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b.instant >= a.instant);
    }
}
