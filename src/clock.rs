//! Tick timestamps.
//!
//! The gesture logic never reads the wall clock itself; the runtime asks a
//! [`Clock`] once per frame and threads that instant through the tick.

use std::time::{Duration, Instant};

pub trait Clock {
    fn now(&mut self) -> Instant;
}

/// Monotonic system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Instant {
        Instant::now()
    }
}

/// Advances by a fixed step on every call, starting at the instant it was
/// created. Used to replay recorded sessions at a nominal frame rate.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    start: Instant,
    step: Duration,
    ticks: u32,
}

impl FixedStepClock {
    pub fn new(step: Duration) -> Self {
        Self {
            start: Instant::now(),
            step,
            ticks: 0,
        }
    }

    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }

    pub fn start(&self) -> Instant {
        self.start
    }
}

impl Clock for FixedStepClock {
    fn now(&mut self) -> Instant {
        let now = self.start + self.step * self.ticks;
        self.ticks += 1;
        now
    }
}
