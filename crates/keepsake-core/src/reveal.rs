//! # Time-Gated Reveal
//!
//! A two-state machine deciding whether the experience is visible yet:
//! `Countdown → Revealed`, or direct entry to `Revealed` when the target
//! instant has already passed at startup. Between the countdown reaching
//! zero and the reveal there is a short internal `Celebrating` phase so
//! the presentation layer can play its finale before the handover.
//!
//! Ticks are fed in by the shell (one per configured interval) carrying a
//! fresh local clock sample; the machine applies the fixed [`SyncedClock`]
//! offset each time. Once the countdown finishes, further ticks are
//! ignored — cancellation happens exactly once and is not re-entered.

use crate::clock::{CountdownSplit, SyncedClock};
use serde::{Deserialize, Serialize};

// =============================================================================
// DEFAULT INTERVALS
// =============================================================================

/// Countdown recomputation interval.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Celebration animation duration once the countdown reaches zero.
pub const DEFAULT_CELEBRATION_MS: u64 = 3000;

/// Fade-out applied after the celebration, before the reveal.
pub const DEFAULT_FADE_MS: u64 = 1000;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Construction-time configuration of a [`RevealGate`].
#[derive(Debug, Clone)]
pub struct RevealConfig {
    /// The reveal instant, unix milliseconds. Immutable for the session.
    pub target_ms: i64,
    /// Countdown recomputation interval.
    pub tick_interval_ms: u64,
    /// Celebration duration at countdown zero.
    pub celebration_ms: u64,
    /// Fade duration after the celebration.
    pub fade_ms: u64,
}

impl RevealConfig {
    /// Config with default intervals for a given target instant.
    #[must_use]
    pub fn new(target_ms: i64) -> Self {
        Self {
            target_ms,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            celebration_ms: DEFAULT_CELEBRATION_MS,
            fade_ms: DEFAULT_FADE_MS,
        }
    }
}

// =============================================================================
// PHASES & SIGNALS
// =============================================================================

/// Phase of the reveal machine. `Revealed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealPhase {
    /// Counting down toward the target.
    Countdown,
    /// Countdown elapsed; the finale is playing before the handover.
    Celebrating,
    /// Content is visible and interactive.
    Revealed,
}

/// Signals emitted by the reveal machine for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum RevealSignal {
    /// Fresh countdown display values.
    CountdownTick { remaining: CountdownSplit },
    /// The countdown reached zero; reveal after `reveal_after_ms`
    /// (celebration plus fade), signalled back via `on_celebration_done`.
    CountdownFinished { reveal_after_ms: u64 },
    /// The content is now visible. Terminal.
    Revealed,
}

// =============================================================================
// REVEAL GATE
// =============================================================================

/// State machine for the time-gated reveal.
#[derive(Debug)]
pub struct RevealGate {
    clock: SyncedClock,
    target_ms: i64,
    phase: RevealPhase,
    tick_interval_ms: u64,
    celebration_ms: u64,
    fade_ms: u64,
}

impl RevealGate {
    /// Decide the initial phase from one local clock sample.
    ///
    /// Before the target: `Countdown`, with an immediate first tick so
    /// the display never shows stale zeros. At or past the target:
    /// `Revealed` directly, no countdown presentation at all.
    #[must_use]
    pub fn start(config: RevealConfig, clock: SyncedClock, local_now_ms: i64) -> (Self, Vec<RevealSignal>) {
        let mut gate = Self {
            clock,
            target_ms: config.target_ms,
            phase: RevealPhase::Countdown,
            tick_interval_ms: config.tick_interval_ms,
            celebration_ms: config.celebration_ms,
            fade_ms: config.fade_ms,
        };

        if clock.now_ms(local_now_ms) < config.target_ms {
            let remaining = gate.remaining_split(local_now_ms);
            (gate, vec![RevealSignal::CountdownTick { remaining }])
        } else {
            gate.phase = RevealPhase::Revealed;
            (gate, vec![RevealSignal::Revealed])
        }
    }

    /// Start directly in the `Revealed` phase (countdown disabled).
    #[must_use]
    pub fn revealed(config: RevealConfig, clock: SyncedClock) -> Self {
        Self {
            clock,
            target_ms: config.target_ms,
            phase: RevealPhase::Revealed,
            tick_interval_ms: config.tick_interval_ms,
            celebration_ms: config.celebration_ms,
            fade_ms: config.fade_ms,
        }
    }

    // -------------------------------------------------------------------------
    // ACCESSORS
    // -------------------------------------------------------------------------

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// Whether the terminal phase has been reached.
    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.phase == RevealPhase::Revealed
    }

    /// The configured tick interval.
    #[must_use]
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    /// The configured target instant.
    #[must_use]
    pub fn target_ms(&self) -> i64 {
        self.target_ms
    }

    /// The clock offset in force for this session.
    #[must_use]
    pub fn clock(&self) -> SyncedClock {
        self.clock
    }

    /// Remaining milliseconds until the target, from a local sample.
    /// Never negative.
    #[must_use]
    pub fn remaining_ms(&self, local_now_ms: i64) -> i64 {
        self.target_ms
            .saturating_sub(self.clock.now_ms(local_now_ms))
            .max(0)
    }

    /// Remaining duration split into display units.
    #[must_use]
    pub fn remaining_split(&self, local_now_ms: i64) -> CountdownSplit {
        CountdownSplit::from_remaining_ms(self.remaining_ms(local_now_ms))
    }

    // -------------------------------------------------------------------------
    // EVENTS
    // -------------------------------------------------------------------------

    /// One countdown tick, carrying a fresh local clock sample.
    ///
    /// Ignored outside the `Countdown` phase, so a straggling tick after
    /// cancellation cannot re-trigger the finale.
    pub fn on_tick(&mut self, local_now_ms: i64) -> Vec<RevealSignal> {
        if self.phase != RevealPhase::Countdown {
            return Vec::new();
        }
        let remaining = self.remaining_ms(local_now_ms);
        if remaining <= 0 {
            self.phase = RevealPhase::Celebrating;
            return vec![RevealSignal::CountdownFinished {
                reveal_after_ms: self.celebration_ms.saturating_add(self.fade_ms),
            }];
        }
        vec![RevealSignal::CountdownTick {
            remaining: CountdownSplit::from_remaining_ms(remaining),
        }]
    }

    /// The celebration delay has elapsed; hand over to the content.
    ///
    /// Ignored unless the machine is in `Celebrating`.
    pub fn on_celebration_done(&mut self) -> Vec<RevealSignal> {
        if self.phase != RevealPhase::Celebrating {
            return Vec::new();
        }
        self.phase = RevealPhase::Revealed;
        vec![RevealSignal::Revealed]
    }
}

// =============================================================================
// TESTS
// =============================================================================
