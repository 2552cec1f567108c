//! # Hidden Messages
//!
//! The easter-egg layer: hearts hidden at fixed slots inside each stage's
//! content reveal a secret message when found. The engine is
//! deterministic, so message selection rotates through the configured
//! deck instead of drawing randomly, and slot assignment rotates by stage
//! index.

use serde::{Deserialize, Serialize};

// =============================================================================
// HEART SLOTS
// =============================================================================

/// A placement slot for a hidden heart, in percent of the stage content
/// box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartSlot {
    pub top_percent: u8,
    pub left_percent: u8,
}

/// Fixed placement table shared by all stages.
const HEART_SLOTS: [HeartSlot; 8] = [
    HeartSlot {
        top_percent: 15,
        left_percent: 10,
    },
    HeartSlot {
        top_percent: 15,
        left_percent: 90,
    },
    HeartSlot {
        top_percent: 50,
        left_percent: 5,
    },
    HeartSlot {
        top_percent: 50,
        left_percent: 95,
    },
    HeartSlot {
        top_percent: 75,
        left_percent: 15,
    },
    HeartSlot {
        top_percent: 75,
        left_percent: 85,
    },
    HeartSlot {
        top_percent: 30,
        left_percent: 50,
    },
    HeartSlot {
        top_percent: 85,
        left_percent: 50,
    },
];

/// Slots for one stage's hidden hearts.
///
/// Rotates through the fixed table by stage index so consecutive stages
/// do not reuse the same corners. `per_stage` is clamped to the table
/// size.
#[must_use]
pub fn hearts_for_stage(stage_index: usize, per_stage: usize) -> Vec<HeartSlot> {
    let per_stage = per_stage.min(HEART_SLOTS.len());
    (0..per_stage)
        .map(|i| HEART_SLOTS[(stage_index * per_stage + i) % HEART_SLOTS.len()])
        .collect()
}

// =============================================================================
// MESSAGE DECK
// =============================================================================

/// Rotating deck of secret messages revealed by found hearts.
#[derive(Debug, Clone, Default)]
pub struct MessageDeck {
    messages: Vec<String>,
    cursor: usize,
}

impl MessageDeck {
    /// Create a deck from the configured message list.
    #[must_use]
    pub fn new(messages: Vec<String>) -> Self {
        Self {
            messages,
            cursor: 0,
        }
    }

    /// Number of messages in the deck.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the deck has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The next message, advancing the cursor; wraps around at the end.
    /// `None` on an empty deck.
    pub fn next_message(&mut self) -> Option<&str> {
        if self.messages.is_empty() {
            return None;
        }
        let idx = self.cursor;
        self.cursor = (self.cursor + 1) % self.messages.len();
        Some(&self.messages[idx])
    }
}

// =============================================================================
// TESTS
// =============================================================================
