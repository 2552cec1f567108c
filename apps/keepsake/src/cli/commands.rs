//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState};
use crate::config::KeepsakeConfig;
use crate::timesync;
use chrono::Utc;
use keepsake_core::{ClockOffset, CountdownSplit, KeepsakeError, ProgressionGate, SyncedClock};
use std::path::Path;

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
///
/// Performs the one-shot time sync before the reveal decision; a failed
/// fetch silently falls back to the local clock.
pub async fn cmd_serve(config_path: &Path, host: &str, port: u16) -> Result<(), KeepsakeError> {
    let config = KeepsakeConfig::load(config_path)?;

    let offset = if config.countdown.enabled && !config.countdown.time_api.is_empty() {
        timesync::fetch_clock_offset(&config.countdown.time_api).await
    } else {
        ClockOffset::ZERO
    };
    let clock = SyncedClock::new(offset);

    let local_now_ms = Utc::now().timestamp_millis();
    let state = AppState::from_config(&config, clock, local_now_ms)?;

    println!("Keepsake Reveal Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:   {}", host);
    println!("  Port:   {}", port);
    println!("  Config: {:?}", config_path);
    println!("  Target: {}", config.countdown.target);
    println!("  Stages: {}", config.stages.len());
    println!();
    println!("Endpoints:");
    println!("  GET  /health                    - Health check");
    println!("  GET  /reveal                    - Countdown / reveal state");
    println!("  GET  /stages                    - Stage list");
    println!("  POST /stages/{{id}}/unlock       - Attempt a secret");
    println!("  POST /stages/{{id}}/display      - Display a stage");
    println!("  POST /stages/{{id}}/play         - Start playback");
    println!("  POST /stages/{{id}}/pause        - Pause playback");
    println!("  POST /stages/{{id}}/media-ended  - Report media completion");
    println!("  GET  /messages/next             - Next hidden message");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    if config.behavior.auto_display_start {
        api::spawn_auto_display(
            state.clone(),
            config.start_stage_id(),
            config.behavior.auto_display_delay_ms,
        );
    }

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show countdown and stage status.
///
/// An offline view: no time fetch, local clock only.
pub fn cmd_status(config_path: &Path, json_mode: bool) -> Result<(), KeepsakeError> {
    let config = KeepsakeConfig::load(config_path)?;
    let target_ms = config.target_ms()?;

    let clock = SyncedClock::local_only();
    let local_now_ms = Utc::now().timestamp_millis();
    let remaining_ms = target_ms.saturating_sub(clock.now_ms(local_now_ms)).max(0);
    let split = CountdownSplit::from_remaining_ms(remaining_ms);
    let reached = remaining_ms == 0;

    if json_mode {
        let output = serde_json::json!({
            "config": config_path.to_string_lossy(),
            "target": config.countdown.target,
            "target_reached": reached,
            "remaining": {
                "days": split.days,
                "hours": split.hours,
                "minutes": split.minutes,
                "seconds": split.seconds,
            },
            "countdown_enabled": config.countdown.enabled,
            "progression": config.behavior.progression,
            "stages": config.stages.iter().map(|s| s.id.to_string()).collect::<Vec<_>>(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Keepsake Status");
    println!("===============");
    println!("Config: {:?}", config_path);
    println!("Target: {}", config.countdown.target);
    if reached {
        println!("Reveal: target reached, content visible");
    } else {
        println!("Reveal: {} until the target (local clock)", split);
    }
    println!();

    let start = config.start_stage_id();
    println!("Stages ({}):", config.stages.len());
    for (i, stage) in config.stages.iter().enumerate() {
        let marker = if stage.id == start { "  (start)" } else { "" };
        println!("  {}. {} - {}{}", i + 1, stage.id, stage.media.as_str(), marker);
    }

    Ok(())
}

// =============================================================================
// CHECK COMMAND
// =============================================================================

/// Validate the configuration file.
pub fn cmd_check(config_path: &Path) -> Result<(), KeepsakeError> {
    let config = KeepsakeConfig::load(config_path)?;

    // Exercise the real construction path, not just field checks.
    ProgressionGate::new(config.gate_config())?;
    let target_ms = config.target_ms()?;

    let local_now_ms = Utc::now().timestamp_millis();
    if target_ms <= local_now_ms {
        println!("Note: countdown target is in the past; the content reveals immediately.");
    }

    println!(
        "Configuration OK: {} stages, target {}",
        config.stages.len(),
        config.countdown.target
    );

    Ok(())
}
