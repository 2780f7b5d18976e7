//! Clock and delay collaborators
//!
//! The protocol engine never reads the wall clock or sleeps directly; it asks
//! an injected [`Clock`] and [`Sleeper`]. Tests substitute virtual time.

use std::time::{Duration, Instant};

/// Monotonic millisecond clock
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin. Never goes backwards.
    fn now_millis(&self) -> u64;
}

/// Blocking delay
pub trait Sleeper: Send + Sync {
    /// Block for at least `millis` milliseconds
    fn sleep(&self, millis: u64);
}

/// Any `Fn(u64)` can stand in as a sleeper
impl<F> Sleeper for F
where
    F: Fn(u64) + Send + Sync,
{
    fn sleep(&self, millis: u64) {
        self(millis)
    }
}

/// [`Clock`] backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// [`Sleeper`] backed by [`std::thread::sleep`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, millis: u64) {
        std::thread::sleep(Duration::from_millis(millis));
    }
}
