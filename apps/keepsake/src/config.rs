//! # Configuration
//!
//! TOML configuration for the Keepsake binary, with serde-backed defaults
//! so a missing file or a sparse one still yields a runnable setup.
//! Deploy-sensitive values can be overridden via `KEEPSAKE_*` environment
//! variables; everything else lives in the file.
//!
//! The countdown target is a human-written local timestamp
//! (`YYYY-MM-DD HH:MM:SS`, RFC 3339 also accepted) converted once into
//! unix milliseconds for the engine.

use keepsake_core::{
    DEFAULT_CELEBRATION_MS, DEFAULT_ERROR_CLEAR_MS, DEFAULT_FADE_MS, DEFAULT_TICK_INTERVAL_MS,
    DEFAULT_UNLOCK_DELAY_MS, GateConfig, KeepsakeError, MediaRef, RevealConfig, Secret,
    StageConfig, StageId,
};
use serde::Deserialize;
use std::path::Path;

// =============================================================================
// DEFAULTS
// =============================================================================

const DEFAULT_TARGET: &str = "2026-02-14 12:00:00";
const DEFAULT_TIME_API: &str = "https://timeapi.io/api/Time/current/zone?timeZone=Europe/Vienna";
const DEFAULT_AUTO_DISPLAY_DELAY_MS: u64 = 500;
const DEFAULT_HEARTS_PER_STAGE: usize = 2;

fn default_true() -> bool {
    true
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_time_api() -> String {
    DEFAULT_TIME_API.to_string()
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_celebration_ms() -> u64 {
    DEFAULT_CELEBRATION_MS
}

fn default_fade_ms() -> u64 {
    DEFAULT_FADE_MS
}

fn default_unlock_delay_ms() -> u64 {
    DEFAULT_UNLOCK_DELAY_MS
}

fn default_error_clear_ms() -> u64 {
    DEFAULT_ERROR_CLEAR_MS
}

fn default_auto_display_delay_ms() -> u64 {
    DEFAULT_AUTO_DISPLAY_DELAY_MS
}

fn default_hearts_per_stage() -> usize {
    DEFAULT_HEARTS_PER_STAGE
}

fn default_stages() -> Vec<StageConfig> {
    [
        ("morning", "sunrise"),
        ("daytime", "together"),
        ("evening", "golden"),
        ("night", "stars"),
    ]
    .into_iter()
    .map(|(id, secret)| StageConfig {
        id: StageId::new(id),
        secret: Secret::new(secret),
        media: MediaRef::new(format!("assets/audio/{id}.mp3")),
    })
    .collect()
}

fn default_secret_messages() -> Vec<String> {
    [
        "You found a piece of my heart.",
        "This was hidden just for you.",
        "Some things exist only to be discovered.",
        "Every moment with you is a secret treasure.",
        "You see what others miss — me.",
        "Distance changes nothing about what is hidden here.",
        "A small piece of forever, just for us.",
        "My heart whispers your name here.",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// =============================================================================
// SECTIONS
// =============================================================================

/// `[countdown]` — the time-gated reveal.
#[derive(Debug, Clone, Deserialize)]
pub struct CountdownSection {
    /// Disable to skip the countdown entirely and reveal on startup.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Target instant, local time, `YYYY-MM-DD HH:MM:SS` or RFC 3339.
    #[serde(default = "default_target")]
    pub target: String,
    /// Remote clock endpoint; empty string disables the fetch.
    #[serde(default = "default_time_api")]
    pub time_api: String,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_celebration_ms")]
    pub celebration_ms: u64,
    #[serde(default = "default_fade_ms")]
    pub fade_ms: u64,
}

impl Default for CountdownSection {
    fn default() -> Self {
        Self {
            enabled: true,
            target: default_target(),
            time_api: default_time_api(),
            tick_interval_ms: default_tick_interval_ms(),
            celebration_ms: default_celebration_ms(),
            fade_ms: default_fade_ms(),
        }
    }
}

/// `[behavior]` — progression and presentation pacing.
#[derive(Debug, Clone, Deserialize)]
pub struct BehaviorSection {
    /// Unlock stages sequentially as prior media completes.
    #[serde(default = "default_true")]
    pub progression: bool,
    /// The stage that starts unlocked; first in sequence when unset.
    #[serde(default)]
    pub start_stage: Option<String>,
    #[serde(default = "default_unlock_delay_ms")]
    pub unlock_delay_ms: u64,
    #[serde(default = "default_error_clear_ms")]
    pub error_clear_ms: u64,
    /// Display the start stage automatically shortly after the reveal.
    #[serde(default = "default_true")]
    pub auto_display_start: bool,
    #[serde(default = "default_auto_display_delay_ms")]
    pub auto_display_delay_ms: u64,
}

impl Default for BehaviorSection {
    fn default() -> Self {
        Self {
            progression: true,
            start_stage: None,
            unlock_delay_ms: default_unlock_delay_ms(),
            error_clear_ms: default_error_clear_ms(),
            auto_display_start: true,
            auto_display_delay_ms: default_auto_display_delay_ms(),
        }
    }
}

/// `[developer]` — non-production switches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeveloperSection {
    /// Start with every stage unlocked.
    #[serde(default)]
    pub unlock_all: bool,
    /// Register the `/debug/*` routes.
    #[serde(default)]
    pub debug_endpoints: bool,
}

/// `[messages]` — the easter-egg layer.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagesSection {
    #[serde(default = "default_secret_messages")]
    pub secret_messages: Vec<String>,
    #[serde(default = "default_hearts_per_stage")]
    pub hearts_per_stage: usize,
}

impl Default for MessagesSection {
    fn default() -> Self {
        Self {
            secret_messages: default_secret_messages(),
            hearts_per_stage: default_hearts_per_stage(),
        }
    }
}

// =============================================================================
// TOP-LEVEL CONFIG
// =============================================================================

/// The full Keepsake configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct KeepsakeConfig {
    #[serde(default)]
    pub countdown: CountdownSection,
    #[serde(default)]
    pub behavior: BehaviorSection,
    #[serde(default)]
    pub developer: DeveloperSection,
    #[serde(default)]
    pub messages: MessagesSection,
    /// Ordered stage sequence (`[[stages]]` tables).
    #[serde(default = "default_stages")]
    pub stages: Vec<StageConfig>,
}

impl Default for KeepsakeConfig {
    fn default() -> Self {
        Self {
            countdown: CountdownSection::default(),
            behavior: BehaviorSection::default(),
            developer: DeveloperSection::default(),
            messages: MessagesSection::default(),
            stages: default_stages(),
        }
    }
}

impl KeepsakeConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file is not an error — the built-in defaults describe a
    /// complete experience. Parse errors and invalid values are.
    pub fn load(path: &Path) -> Result<Self, KeepsakeError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path).map_err(|e| {
                KeepsakeError::IoError(format!("read config {}: {}", path.display(), e))
            })?;
            toml::from_str::<Self>(&text).map_err(|e| {
                KeepsakeError::ParseError(format!("config {}: {}", path.display(), e))
            })?
        } else {
            tracing::info!("no config file at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `KEEPSAKE_*` environment overrides for deploy-sensitive
    /// values.
    fn apply_env_overrides(&mut self) {
        if let Ok(target) = std::env::var("KEEPSAKE_TARGET")
            && !target.is_empty()
        {
            self.countdown.target = target;
        }
        if let Ok(url) = std::env::var("KEEPSAKE_TIME_API") {
            // An explicitly empty value disables the fetch.
            self.countdown.time_api = url;
        }
    }

    /// Validate values the type system cannot.
    pub fn validate(&self) -> Result<(), KeepsakeError> {
        if self.stages.is_empty() {
            return Err(KeepsakeError::InvalidConfig(
                "at least one stage is required".to_string(),
            ));
        }
        if self.countdown.tick_interval_ms == 0 {
            return Err(KeepsakeError::InvalidConfig(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        // Fails early on an unparseable target.
        self.target_ms()?;
        Ok(())
    }

    /// The countdown target as unix milliseconds.
    pub fn target_ms(&self) -> Result<i64, KeepsakeError> {
        parse_local_timestamp_ms(&self.countdown.target)
    }

    /// Gate configuration for the engine.
    #[must_use]
    pub fn gate_config(&self) -> GateConfig {
        GateConfig {
            stages: self.stages.clone(),
            start_stage: self.behavior.start_stage.clone().map(StageId::new),
            progression_enabled: self.behavior.progression,
            unlock_all: self.developer.unlock_all,
            unlock_delay_ms: self.behavior.unlock_delay_ms,
            error_clear_ms: self.behavior.error_clear_ms,
        }
    }

    /// Reveal configuration for the engine.
    pub fn reveal_config(&self) -> Result<RevealConfig, KeepsakeError> {
        Ok(RevealConfig {
            target_ms: self.target_ms()?,
            tick_interval_ms: self.countdown.tick_interval_ms,
            celebration_ms: self.countdown.celebration_ms,
            fade_ms: self.countdown.fade_ms,
        })
    }

    /// The effective start stage identifier.
    #[must_use]
    pub fn start_stage_id(&self) -> StageId {
        self.behavior
            .start_stage
            .clone()
            .map(StageId::new)
            .unwrap_or_else(|| self.stages[0].id.clone())
    }
}

// =============================================================================
// TIMESTAMP PARSING
// =============================================================================

/// Parse a configured timestamp into unix milliseconds.
///
/// Accepts RFC 3339, or a bare `YYYY-MM-DD HH:MM:SS` interpreted in the
/// host's local timezone (what the original page did with its target
/// date).
pub fn parse_local_timestamp_ms(raw: &str) -> Result<i64, KeepsakeError> {
    use chrono::{Local, NaiveDateTime, TimeZone};

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }

    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|e| KeepsakeError::ParseError(format!("timestamp {raw:?}: {e}")))?;

    match Local.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => Ok(dt.timestamp_millis()),
        chrono::LocalResult::Ambiguous(dt, _) => Ok(dt.timestamp_millis()),
        chrono::LocalResult::None => Err(KeepsakeError::ParseError(format!(
            "timestamp {raw:?} does not exist in the local timezone"
        ))),
    }
}

// =============================================================================
// TESTS
// =============================================================================
