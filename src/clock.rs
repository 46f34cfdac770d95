//! Wall clock and whole-second production accounting.
//!
//! Passive production is settled lazily from `last_tick_ms`. Only whole
//! elapsed seconds are consumed; the sub-second remainder stays behind
//! `last_tick_ms` so it is counted on the next settle instead of being lost.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in unix milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Real time from the OS.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            // Clock before 1970: treat as epoch.
            .unwrap_or(0)
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Default)]
pub struct ManualClock {
    now_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(now_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(now_ms),
        }
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance_ms(secs.saturating_mul(1_000));
    }

    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Whole seconds due between `last_ms` and `now_ms`, and the new
/// `last_ms` after consuming them.
///
/// A clock that went backwards yields zero and leaves `last_ms` unchanged.
pub fn due_seconds(last_ms: u64, now_ms: u64) -> (u64, u64) {
    let elapsed_ms = now_ms.saturating_sub(last_ms);
    let seconds = elapsed_ms / 1_000;
    (seconds, last_ms + seconds * 1_000)
}

/// Convert a caller-supplied interval to whole milliseconds, rounding to
/// the nearest millisecond.
pub fn seconds_to_ms(seconds: f64) -> u64 {
    (seconds * 1_000.0).round() as u64
}
