//! # keepsake-core
//!
//! The deterministic reveal engine for Keepsake - THE LOGIC.
//!
//! This crate implements the two machines behind the gift experience:
//! the progression gate (ordered stages unlocked by secret or by media
//! completion) and the time-gated reveal (best-effort clock sync plus a
//! countdown that hands over to the content). Around them sit the
//! playback singleton and the hidden-message deck.
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Is the only place where progression state lives (per session; no
//!   persistence — state resets on restart, like a page reload)
//! - Never initiates anything; it only reacts to explicit events and
//!   emits signals for the presentation layer
//! - Has NO async, NO network dependencies, NO wall-clock reads: time
//!   arrives as explicit millisecond parameters (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod clock;
pub mod gate;
pub mod messages;
pub mod player;
pub mod reveal;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{KeepsakeError, MediaRef, Secret, StageId};

// =============================================================================
// RE-EXPORTS: Clock Arithmetic
// =============================================================================

pub use clock::{
    ClockOffset, CountdownSplit, MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE,
    MILLIS_PER_SECOND, SyncedClock,
};

// =============================================================================
// RE-EXPORTS: Progression Gate
// =============================================================================

pub use gate::{
    AttemptOutcome, DEFAULT_ERROR_CLEAR_MS, DEFAULT_UNLOCK_DELAY_MS, GateConfig, GateSignal,
    ProgressionGate, StageConfig,
};

// =============================================================================
// RE-EXPORTS: Time-Gated Reveal
// =============================================================================

pub use reveal::{
    DEFAULT_CELEBRATION_MS, DEFAULT_FADE_MS, DEFAULT_TICK_INTERVAL_MS, RevealConfig, RevealGate,
    RevealPhase, RevealSignal,
};

// =============================================================================
// RE-EXPORTS: Playback & Messages
// =============================================================================

pub use messages::{HeartSlot, MessageDeck, hearts_for_stage};
pub use player::{Playback, PlaybackSignal};
