//! # Core Type Definitions
//!
//! This module contains the shared types for the Keepsake reveal engine:
//! - Stage identity and configuration atoms (`StageId`, `Secret`, `MediaRef`)
//! - Error types (`KeepsakeError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// STAGE IDENTIFIER
// =============================================================================

/// Identifier of a stage (one gated "moment" of the experience).
///
/// Stage identifiers are configuration-defined strings; the engine never
/// interprets them beyond equality and the configured ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageId(pub String);

impl StageId {
    /// Create a new stage identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// SECRET
// =============================================================================

/// The unlock secret configured for a stage.
///
/// Secrets are stored and compared in cleartext. The comparison is an
/// advisory gate for a single trusted user, not a security boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret(pub String);

impl Secret {
    /// Create a new secret from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Compare a user-supplied value against this secret.
    ///
    /// Both sides are trimmed and lowercased first, so `"SUNRISE "`
    /// matches a configured `"sunrise"`.
    #[must_use]
    pub fn matches(&self, supplied: &str) -> bool {
        supplied.trim().to_lowercase() == self.0.trim().to_lowercase()
    }
}

// =============================================================================
// MEDIA REFERENCE
// =============================================================================

/// Opaque handle to a stage's media (an audio asset path or URL).
///
/// The engine never opens media; playback happens in the presentation
/// layer, which reports completion back as an event.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MediaRef(pub String);

impl MediaRef {
    /// Create a new media reference from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Keepsake system.
///
/// - No silent failures for programmer mistakes at construction time
/// - Runtime invariant violations (events for hidden or unknown stages)
///   are handled as no-ops by the state machines, not as errors
/// - The engine should never panic; all errors are recoverable
#[derive(Debug, Error)]
pub enum KeepsakeError {
    /// The referenced stage is not part of the configured sequence.
    #[error("Unknown stage: {0}")]
    UnknownStage(String),

    /// The configuration is structurally invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A value could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
