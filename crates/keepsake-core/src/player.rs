//! # Playback Singleton
//!
//! Tracks which stage's media is active. At most one track plays at a
//! time: starting one stage pauses any other first. Pausing never resets
//! the playhead — position is owned by the presentation layer, the
//! engine only tracks which track is live.

use crate::types::StageId;
use serde::{Deserialize, Serialize};

// =============================================================================
// SIGNALS
// =============================================================================

/// Signals emitted by the playback tracker for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum PlaybackSignal {
    /// Playback of a stage's media started (or resumed).
    Started { stage: StageId },
    /// Playback of a stage's media paused, position retained.
    Paused { stage: StageId },
    /// A stage's media played through to the end.
    Ended { stage: StageId },
}

// =============================================================================
// PLAYBACK
// =============================================================================

/// Single-active-track playback state.
#[derive(Debug, Default)]
pub struct Playback {
    playing: Option<StageId>,
}

impl Playback {
    /// Create an idle tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stage currently playing, if any.
    #[must_use]
    pub fn playing(&self) -> Option<&StageId> {
        self.playing.as_ref()
    }

    /// Start a stage's media, pausing whatever else was playing first.
    ///
    /// No-op when the stage is already the active track.
    pub fn play(&mut self, stage: &StageId) -> Vec<PlaybackSignal> {
        if self.playing.as_ref() == Some(stage) {
            return Vec::new();
        }
        let mut signals = self.pause_all();
        self.playing = Some(stage.clone());
        signals.push(PlaybackSignal::Started {
            stage: stage.clone(),
        });
        signals
    }

    /// Toggle a stage: pause it if playing, otherwise start it.
    pub fn toggle(&mut self, stage: &StageId) -> Vec<PlaybackSignal> {
        if self.playing.as_ref() == Some(stage) {
            self.pause_all()
        } else {
            self.play(stage)
        }
    }

    /// Pause the active track, if any.
    pub fn pause_all(&mut self) -> Vec<PlaybackSignal> {
        match self.playing.take() {
            Some(stage) => vec![PlaybackSignal::Paused { stage }],
            None => Vec::new(),
        }
    }

    /// A stage's media reached its end.
    ///
    /// Clears the active track when it matches; the `Ended` signal is
    /// emitted either way so completion reaches the progression gate.
    pub fn on_ended(&mut self, stage: &StageId) -> Vec<PlaybackSignal> {
        if self.playing.as_ref() == Some(stage) {
            self.playing = None;
        }
        vec![PlaybackSignal::Ended {
            stage: stage.clone(),
        }]
    }
}

// =============================================================================
// TESTS
// =============================================================================
