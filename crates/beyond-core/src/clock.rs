//! Time sources and the displayed session timer.
//!
//! Two notions of time coexist in the game:
//!
//! - **True time** ([`Clock::now_ms`]) drives modifier expiry and the
//!   auto-trigger schedule. It never stops.
//! - **Displayed elapsed time** ([`SessionTimer`]) is what the player sees.
//!   It stands still while a freeze-clock effect is active.
//!
//! All timestamps are epoch milliseconds (`i64`). Elapsed-time derivations
//! use saturating arithmetic so a skewed clock can never panic.

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// A source of true (never frozen) wall-clock time.
pub trait Clock: Send + Sync + Debug {
    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can hold one handle
/// while the session holds another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    /// Create a manual clock reading `start_ms`.
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    /// Set the current time.
    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::Release);
    }

    /// Move the clock forward by `delta_ms`, saturating at `i64::MAX`.
    pub fn advance(&self, delta_ms: i64) {
        let current = self.now.load(Ordering::Acquire);
        self.now
            .store(current.saturating_add(delta_ms), Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::Acquire)
    }
}

/// The player-visible elapsed-time counter.
///
/// While `now < frozen_until` the displayed value stays at the last value
/// observed before the freeze; afterwards it jumps back to true elapsed
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimer {
    /// Epoch milliseconds the player started.
    start_time: i64,
    /// Last instant at which the timer was observed unfrozen.
    last_tick: i64,
}

impl SessionTimer {
    /// A timer for a player who started at `start_time`, observed at `now`.
    pub const fn new(start_time: i64, now: i64) -> Self {
        Self {
            start_time,
            last_tick: if now > start_time { now } else { start_time },
        }
    }

    /// The start time this timer counts from.
    pub const fn start_time(&self) -> i64 {
        self.start_time
    }

    /// Displayed elapsed milliseconds at `now`, given the freeze deadline.
    ///
    /// Never negative.
    pub fn elapsed_ms(&mut self, now: i64, frozen_until: i64) -> i64 {
        let reference = if now < frozen_until {
            self.last_tick
        } else {
            self.last_tick = now;
            now
        };
        reference.saturating_sub(self.start_time).max(0)
    }
}
