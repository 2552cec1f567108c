//! # Progression Gate
//!
//! The state machine behind the staged reveal: an ordered, fixed set of
//! stages, each `locked` or `unlocked`, plus a "currently displayed"
//! pointer. A stage unlocks either through a correct secret or
//! automatically once the prior stage's media has finished playing.
//!
//! The gate is pure: events go in, [`GateSignal`]s come out, and the
//! presentation layer decides what to render. Delays are not slept here —
//! `on_media_completed` emits [`GateSignal::UnlockScheduled`] and the
//! shell feeds back [`ProgressionGate::on_unlock_due`] once the delay has
//! elapsed.
//!
//! ## Invariants
//!
//! - The unlock set only grows; a stage never re-locks within a session.
//! - A stage beyond the unlocked frontier cannot be unlocked, by secret
//!   or otherwise (the debug override is the one exception).
//! - Repeated media-completion events for the same stage schedule at most
//!   one follow-up unlock.

use crate::types::{KeepsakeError, MediaRef, Secret, StageId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// DEFAULT INTERVALS
// =============================================================================

/// Delay between a media completion and the next stage's unlock, so the
/// presentation transition has time to play.
pub const DEFAULT_UNLOCK_DELAY_MS: u64 = 500;

/// How long the wrong-secret message stays visible before auto-clearing.
pub const DEFAULT_ERROR_CLEAR_MS: u64 = 3000;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// One stage of the configured sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stage identifier, unique within the sequence.
    pub id: StageId,
    /// Unlock secret for this stage.
    pub secret: Secret,
    /// Media handle the presentation layer plays for this stage.
    pub media: MediaRef,
}

/// Construction-time configuration of a [`ProgressionGate`].
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Ordered stage sequence. Order is fixed for the session.
    pub stages: Vec<StageConfig>,
    /// The stage that starts unlocked. Defaults to the first in sequence.
    pub start_stage: Option<StageId>,
    /// Whether media completion unlocks the following stage.
    pub progression_enabled: bool,
    /// Debug override: start with every stage unlocked.
    pub unlock_all: bool,
    /// Delay attached to scheduled unlocks.
    pub unlock_delay_ms: u64,
    /// Auto-clear interval attached to wrong-secret signals.
    pub error_clear_ms: u64,
}

impl GateConfig {
    /// Config with default intervals and progression enabled.
    #[must_use]
    pub fn new(stages: Vec<StageConfig>) -> Self {
        Self {
            stages,
            start_stage: None,
            progression_enabled: true,
            unlock_all: false,
            unlock_delay_ms: DEFAULT_UNLOCK_DELAY_MS,
            error_clear_ms: DEFAULT_ERROR_CLEAR_MS,
        }
    }
}

// =============================================================================
// SIGNALS
// =============================================================================

/// Signals emitted by the gate for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum GateSignal {
    /// A stage joined the unlock set.
    StageUnlocked { stage: StageId },
    /// The displayed-stage pointer moved.
    StageDisplayed { stage: StageId },
    /// A supplied secret did not match; the message auto-clears after
    /// `clear_after_ms`.
    SecretWrong { stage: StageId, clear_after_ms: u64 },
    /// The next stage should unlock after `after_ms`; the shell calls
    /// `on_unlock_due` once the delay has elapsed.
    UnlockScheduled { stage: StageId, after_ms: u64 },
}

/// Outcome of a secret attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// The secret matched and the stage unlocked.
    Unlocked,
    /// The stage was already unlocked; nothing changed.
    AlreadyUnlocked,
    /// The secret did not match; nothing changed.
    WrongSecret,
    /// The stage is beyond the unlocked frontier and not eligible for a
    /// secret attempt; rejected silently.
    Hidden,
}

// =============================================================================
// PROGRESSION GATE
// =============================================================================

/// Controller owning all progression state for one session.
///
/// Nothing here persists: a fresh gate starts from the configured initial
/// state, matching a page reload in the original experience.
#[derive(Debug)]
pub struct ProgressionGate {
    stages: Vec<StageConfig>,
    /// Unlock set in unlock order. Monotonically growing.
    unlocked: Vec<StageId>,
    displayed: Option<StageId>,
    media_done: BTreeSet<StageId>,
    pending: BTreeSet<StageId>,
    progression_enabled: bool,
    unlock_delay_ms: u64,
    error_clear_ms: u64,
}

impl ProgressionGate {
    /// Build a gate from configuration.
    ///
    /// Validates that the sequence is non-empty, identifiers are unique,
    /// and the start stage (when given) is part of the sequence.
    pub fn new(config: GateConfig) -> Result<Self, KeepsakeError> {
        if config.stages.is_empty() {
            return Err(KeepsakeError::InvalidConfig(
                "at least one stage is required".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for stage in &config.stages {
            if !seen.insert(stage.id.clone()) {
                return Err(KeepsakeError::InvalidConfig(format!(
                    "duplicate stage id: {}",
                    stage.id
                )));
            }
        }

        let start = match config.start_stage {
            Some(id) => {
                if !seen.contains(&id) {
                    return Err(KeepsakeError::InvalidConfig(format!(
                        "start stage {} is not in the sequence",
                        id
                    )));
                }
                id
            }
            None => config.stages[0].id.clone(),
        };

        let unlocked = if config.unlock_all {
            config.stages.iter().map(|s| s.id.clone()).collect()
        } else {
            vec![start]
        };

        Ok(Self {
            stages: config.stages,
            unlocked,
            displayed: None,
            media_done: BTreeSet::new(),
            pending: BTreeSet::new(),
            progression_enabled: config.progression_enabled,
            unlock_delay_ms: config.unlock_delay_ms,
            error_clear_ms: config.error_clear_ms,
        })
    }

    // -------------------------------------------------------------------------
    // ACCESSORS
    // -------------------------------------------------------------------------

    /// The configured stage sequence, in order.
    #[must_use]
    pub fn stages(&self) -> &[StageConfig] {
        &self.stages
    }

    /// The unlock set, in unlock order.
    #[must_use]
    pub fn unlocked(&self) -> &[StageId] {
        &self.unlocked
    }

    /// The currently displayed stage, if any.
    #[must_use]
    pub fn displayed(&self) -> Option<&StageId> {
        self.displayed.as_ref()
    }

    /// Whether a stage is in the unlock set.
    #[must_use]
    pub fn is_unlocked(&self, stage: &StageId) -> bool {
        self.unlocked.contains(stage)
    }

    /// The stage following `stage` in the configured order, if any.
    #[must_use]
    pub fn next_after(&self, stage: &StageId) -> Option<&StageId> {
        let idx = self.index_of(stage)?;
        self.stages.get(idx + 1).map(|s| &s.id)
    }

    fn index_of(&self, stage: &StageId) -> Option<usize> {
        self.stages.iter().position(|s| &s.id == stage)
    }

    /// A stage is reachable for a secret attempt when it is already
    /// unlocked, first in sequence, or directly after an unlocked stage.
    fn is_reachable(&self, idx: usize) -> bool {
        if self.is_unlocked(&self.stages[idx].id) {
            return true;
        }
        match idx.checked_sub(1) {
            None => true,
            Some(prev) => self.is_unlocked(&self.stages[prev].id),
        }
    }

    fn push_unlocked(&mut self, stage: &StageId) {
        self.pending.remove(stage);
        self.unlocked.push(stage.clone());
    }

    // -------------------------------------------------------------------------
    // EVENTS
    // -------------------------------------------------------------------------

    /// Attempt to unlock a stage with a supplied secret.
    ///
    /// The comparison is trimmed and case-insensitive. A matching secret
    /// unlocks and displays the stage; a mismatch leaves all state
    /// untouched and emits a transient [`GateSignal::SecretWrong`].
    /// Attempts against hidden stages are silent no-ops — the gate
    /// re-validates what the UI should already prevent.
    pub fn attempt_unlock(
        &mut self,
        stage: &StageId,
        supplied: &str,
    ) -> Result<(AttemptOutcome, Vec<GateSignal>), KeepsakeError> {
        let idx = self
            .index_of(stage)
            .ok_or_else(|| KeepsakeError::UnknownStage(stage.to_string()))?;

        if self.is_unlocked(stage) {
            return Ok((AttemptOutcome::AlreadyUnlocked, Vec::new()));
        }
        if !self.is_reachable(idx) {
            return Ok((AttemptOutcome::Hidden, Vec::new()));
        }

        if self.stages[idx].secret.matches(supplied) {
            self.push_unlocked(stage);
            self.displayed = Some(stage.clone());
            Ok((
                AttemptOutcome::Unlocked,
                vec![
                    GateSignal::StageUnlocked {
                        stage: stage.clone(),
                    },
                    GateSignal::StageDisplayed {
                        stage: stage.clone(),
                    },
                ],
            ))
        } else {
            Ok((
                AttemptOutcome::WrongSecret,
                vec![GateSignal::SecretWrong {
                    stage: stage.clone(),
                    clear_after_ms: self.error_clear_ms,
                }],
            ))
        }
    }

    /// React to a stage's media finishing.
    ///
    /// Idempotent per stage: only the first completion can schedule the
    /// next stage's unlock, and only when progression is enabled and the
    /// next stage is neither unlocked nor already pending. Unknown or
    /// still-locked stages are ignored — locked media cannot have played.
    pub fn on_media_completed(&mut self, stage: &StageId) -> Vec<GateSignal> {
        let Some(idx) = self.index_of(stage) else {
            return Vec::new();
        };
        if !self.is_unlocked(stage) {
            return Vec::new();
        }
        if !self.media_done.insert(stage.clone()) {
            return Vec::new();
        }
        if !self.progression_enabled {
            return Vec::new();
        }
        let Some(next) = self.stages.get(idx + 1).map(|s| s.id.clone()) else {
            // Last stage in sequence: nothing further to unlock.
            return Vec::new();
        };
        if self.is_unlocked(&next) || self.pending.contains(&next) {
            return Vec::new();
        }
        self.pending.insert(next.clone());
        vec![GateSignal::UnlockScheduled {
            stage: next,
            after_ms: self.unlock_delay_ms,
        }]
    }

    /// Apply a previously scheduled unlock.
    ///
    /// No-op if the stage is not pending (it may have been unlocked by
    /// secret in the meantime, absorbing the schedule).
    pub fn on_unlock_due(&mut self, stage: &StageId) -> Vec<GateSignal> {
        if !self.pending.remove(stage) {
            return Vec::new();
        }
        if self.is_unlocked(stage) {
            return Vec::new();
        }
        self.unlocked.push(stage.clone());
        vec![GateSignal::StageUnlocked {
            stage: stage.clone(),
        }]
    }

    /// Move the displayed-stage pointer.
    ///
    /// Silent no-op for locked or unknown stages.
    pub fn display_stage(&mut self, stage: &StageId) -> Vec<GateSignal> {
        if !self.is_unlocked(stage) {
            return Vec::new();
        }
        self.displayed = Some(stage.clone());
        vec![GateSignal::StageDisplayed {
            stage: stage.clone(),
        }]
    }

    /// Administrative override: unlock every stage immediately.
    ///
    /// Emits one [`GateSignal::StageUnlocked`] per newly unlocked stage.
    pub fn set_all_unlocked(&mut self) -> Vec<GateSignal> {
        let ids: Vec<StageId> = self.stages.iter().map(|s| s.id.clone()).collect();
        let mut signals = Vec::new();
        for id in ids {
            if !self.is_unlocked(&id) {
                self.push_unlocked(&id);
                signals.push(GateSignal::StageUnlocked { stage: id });
            }
        }
        signals
    }
}

// =============================================================================
// TESTS
// =============================================================================
