use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};

/// Session length assumed when the server's start/duration cannot be read.
pub const DEFAULT_FALLBACK_DURATION_SECS: u32 = 30 * 60;

//
// ─── DEADLINE STATE ───────────────────────────────────────────────────────────
//

/// Server-issued baseline for a session's time limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineState {
    start_time: DateTime<Utc>,
    duration_seconds: u32,
}

impl DeadlineState {
    #[must_use]
    pub fn new(start_time: DateTime<Utc>, duration_seconds: u32) -> Self {
        Self {
            start_time,
            duration_seconds,
        }
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    #[must_use]
    pub fn ends_at(&self) -> DateTime<Utc> {
        self.start_time + Duration::seconds(i64::from(self.duration_seconds))
    }

    /// Whole seconds left at `now`, floored and clamped at zero.
    #[must_use]
    pub fn remaining_at(&self, now: DateTime<Utc>) -> u32 {
        let left = self.ends_at() - now;
        if left <= Duration::zero() {
            return 0;
        }
        u32::try_from(left.num_seconds()).unwrap_or(u32::MAX)
    }
}

/// Where the deadline baseline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineSource {
    Server,
    /// Degraded mode: the server's baseline was unavailable.
    LocalFallback,
}

/// Named policy for running a session without the server's baseline.
///
/// Any failure to read the session state (not only "no active session")
/// falls back to a fixed duration anchored at local load time. This can make
/// an outage look like a normal timed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub duration_seconds: u32,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_FALLBACK_DURATION_SECS,
        }
    }
}

impl FallbackPolicy {
    #[must_use]
    pub fn anchor(self, loaded_at: DateTime<Utc>) -> DeadlineState {
        DeadlineState::new(loaded_at, self.duration_seconds)
    }
}

//
// ─── EXPIRY LATCH ─────────────────────────────────────────────────────────────
//

/// One-shot expiry flag shared between the deadline monitor and the session.
///
/// Cloning shares the flag. It can only go from unfired to fired.
#[derive(Debug, Clone, Default)]
pub struct ExpiryLatch(Arc<AtomicBool>);

impl ExpiryLatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` only for the call that fired the latch.
    pub fn fire(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    #[must_use]
    pub fn is_fired(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

//
// ─── DEADLINE MONITOR ─────────────────────────────────────────────────────────
//

/// Result of one monitor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeadlineTick {
    pub remaining: u32,
    /// True only on the tick that fired the expiry signal.
    pub expired_now: bool,
}

impl DeadlineTick {
    #[must_use]
    pub fn label(&self) -> String {
        format_remaining(self.remaining)
    }
}

/// Recomputes remaining time from absolute timestamps on every tick.
///
/// Nothing is decremented, so a late or skipped tick still lands on the right
/// value. The reported remaining time never goes up; reopening a session
/// starts a new monitor from the server's start and duration.
#[derive(Debug, Clone)]
pub struct DeadlineMonitor {
    state: DeadlineState,
    source: DeadlineSource,
    latch: ExpiryLatch,
    last_remaining: Option<u32>,
}

impl DeadlineMonitor {
    #[must_use]
    pub fn start(start_time: DateTime<Utc>, duration_seconds: u32, latch: ExpiryLatch) -> Self {
        Self {
            state: DeadlineState::new(start_time, duration_seconds),
            source: DeadlineSource::Server,
            latch,
            last_remaining: None,
        }
    }

    #[must_use]
    pub fn fallback(policy: FallbackPolicy, loaded_at: DateTime<Utc>, latch: ExpiryLatch) -> Self {
        Self {
            state: policy.anchor(loaded_at),
            source: DeadlineSource::LocalFallback,
            latch,
            last_remaining: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> DeadlineState {
        self.state
    }

    #[must_use]
    pub fn source(&self) -> DeadlineSource {
        self.source
    }

    #[must_use]
    pub fn latch(&self) -> &ExpiryLatch {
        &self.latch
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.latch.is_fired()
    }

    pub fn tick(&mut self, now: DateTime<Utc>) -> DeadlineTick {
        let computed = self.state.remaining_at(now);
        let remaining = self
            .last_remaining
            .map_or(computed, |last| last.min(computed));
        self.last_remaining = Some(remaining);

        let expired_now = remaining == 0 && self.latch.fire();
        DeadlineTick {
            remaining,
            expired_now,
        }
    }
}

/// `MM:SS`, zero padded. Minutes are not wrapped into hours.
#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
