//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. The signal enums serialize straight
//! from the engine, so the page consumes exactly what the machines emit.

use keepsake_core::{
    AttemptOutcome, CountdownSplit, GateSignal, HeartSlot, PlaybackSignal, RevealPhase,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// REVEAL RESPONSE
// =============================================================================

/// Countdown / reveal state for the 1 Hz poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealResponse {
    pub phase: RevealPhase,
    /// Present only while counting down.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub remaining: Option<CountdownSplit>,
    pub target_ms: i64,
    pub offset_ms: i64,
}

// =============================================================================
// STAGES RESPONSE
// =============================================================================

/// One stage as the page sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageJson {
    pub id: String,
    pub media: String,
    pub unlocked: bool,
    pub playing: bool,
    /// Hidden-heart placement slots for this stage's content.
    pub hearts: Vec<HeartSlot>,
}

/// Stage list with unlock state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesResponse {
    pub stages: Vec<StageJson>,
    pub displayed: Option<String>,
}

// =============================================================================
// UNLOCK REQUEST/RESPONSE
// =============================================================================

/// Secret attempt request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub secret: String,
}

/// Secret attempt response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockResponse {
    pub outcome: Option<AttemptOutcome>,
    pub signals: Vec<GateSignal>,
    pub error: Option<String>,
}

impl UnlockResponse {
    pub fn result(outcome: AttemptOutcome, signals: Vec<GateSignal>) -> Self {
        Self {
            outcome: Some(outcome),
            signals,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            outcome: None,
            signals: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// DISPLAY RESPONSE
// =============================================================================

/// Displayed-pointer move response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayResponse {
    /// False when the gate silently rejected a locked/unknown stage.
    pub displayed: bool,
    pub signals: Vec<GateSignal>,
}

// =============================================================================
// PLAYBACK RESPONSE
// =============================================================================

/// Playback mutation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackResponse {
    /// The active track after the mutation, if any.
    pub playing: Option<String>,
    pub signals: Vec<PlaybackSignal>,
}

// =============================================================================
// MEDIA-ENDED RESPONSE
// =============================================================================

/// Media completion response: playback bookkeeping plus whatever the
/// progression gate decided to schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaEndedResponse {
    pub playback: Vec<PlaybackSignal>,
    pub gate: Vec<GateSignal>,
}

// =============================================================================
// MESSAGE RESPONSE
// =============================================================================

/// Next hidden message, `None` when no messages are configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: Option<String>,
}

// =============================================================================
// GENERIC SIGNALS RESPONSE
// =============================================================================

/// Bare gate-signal list (debug override).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalsResponse {
    pub signals: Vec<GateSignal>,
}
