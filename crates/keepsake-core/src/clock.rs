//! # Clock Offset & Countdown Arithmetic
//!
//! The engine never reads a wall clock. The shell samples its local clock
//! and passes unix-millisecond timestamps into every time-dependent event;
//! this module holds the arithmetic applied to those samples:
//!
//! - [`ClockOffset`]: authoritative minus local time, measured once at
//!   startup and never refreshed (drift over a session is accepted)
//! - [`SyncedClock`]: derives "current authoritative time" from a local
//!   sample plus the fixed offset
//! - [`CountdownSplit`]: whole days/hours/minutes/seconds by floor division
//!
//! All arithmetic is integer-only and saturating.

use serde::{Deserialize, Serialize};

// =============================================================================
// MILLISECOND CONSTANTS
// =============================================================================

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: i64 = 1000;

/// Milliseconds per minute.
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;

/// Milliseconds per hour.
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

/// Milliseconds per day.
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

// =============================================================================
// CLOCK OFFSET
// =============================================================================

/// Signed correction applied to local time to approximate authoritative
/// server time: `authoritative - local`, in milliseconds.
///
/// Zero when the remote time source was unavailable — the session then
/// runs on the local clock transparently.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ClockOffset(pub i64);

impl ClockOffset {
    /// The zero offset (local time is authoritative).
    pub const ZERO: Self = Self(0);

    /// Create an offset from a raw millisecond value.
    #[must_use]
    pub const fn new(millis: i64) -> Self {
        Self(millis)
    }

    /// Compute the offset from one paired sample of authoritative and
    /// local time.
    #[must_use]
    pub const fn from_sample(authoritative_ms: i64, local_ms: i64) -> Self {
        Self(authoritative_ms.saturating_sub(local_ms))
    }

    /// Get the raw offset in milliseconds.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Whether this offset leaves local time unchanged.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// SYNCED CLOCK
// =============================================================================

/// A local clock corrected by a fixed [`ClockOffset`].
///
/// The offset is decided once at construction; `now_ms` applies it to
/// every subsequent local sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncedClock {
    offset: ClockOffset,
}

impl SyncedClock {
    /// Create a clock with the given offset.
    #[must_use]
    pub const fn new(offset: ClockOffset) -> Self {
        Self { offset }
    }

    /// Create a clock that trusts local time (zero offset).
    #[must_use]
    pub const fn local_only() -> Self {
        Self {
            offset: ClockOffset::ZERO,
        }
    }

    /// Current authoritative time derived from a local sample.
    #[must_use]
    pub const fn now_ms(&self, local_ms: i64) -> i64 {
        local_ms.saturating_add(self.offset.0)
    }

    /// The fixed offset this clock applies.
    #[must_use]
    pub const fn offset(&self) -> ClockOffset {
        self.offset
    }
}

// =============================================================================
// COUNTDOWN SPLIT
// =============================================================================

/// A remaining duration broken into whole days, hours, minutes and
/// seconds by floor division. All components are non-negative; a
/// non-positive remaining duration collapses to all zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownSplit {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl CountdownSplit {
    /// The zero split (countdown elapsed).
    pub const ZERO: Self = Self {
        days: 0,
        hours: 0,
        minutes: 0,
        seconds: 0,
    };

    /// Split a remaining duration in milliseconds into display units.
    #[must_use]
    pub const fn from_remaining_ms(remaining_ms: i64) -> Self {
        if remaining_ms <= 0 {
            return Self::ZERO;
        }
        Self {
            days: remaining_ms / MILLIS_PER_DAY,
            hours: (remaining_ms % MILLIS_PER_DAY) / MILLIS_PER_HOUR,
            minutes: (remaining_ms % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
            seconds: (remaining_ms % MILLIS_PER_MINUTE) / MILLIS_PER_SECOND,
        }
    }

    /// Whether every component is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }
}

impl std::fmt::Display for CountdownSplit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}d {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
