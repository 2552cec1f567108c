//! # API Endpoint Handlers
//!
//! The actual HTTP endpoint handlers. Each mutation forwards one event
//! into the engine, echoes the emitted signals back to the caller, and
//! arms whatever one-shot timers the signals ask for.

use super::{
    AppState, spawn_delayed_unlock,
    types::{
        DisplayResponse, HealthResponse, MediaEndedResponse, MessageResponse, PlaybackResponse,
        RevealResponse, SignalsResponse, StageJson, StagesResponse, UnlockRequest, UnlockResponse,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use keepsake_core::{GateSignal, KeepsakeError, RevealPhase, StageId, hearts_for_stage};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// REVEAL HANDLER
// =============================================================================

/// Countdown / reveal state.
pub async fn reveal_handler(State(state): State<AppState>) -> impl IntoResponse {
    let reveal = state.reveal.read().await;
    let local_now_ms = Utc::now().timestamp_millis();

    let phase = reveal.phase();
    let remaining = match phase {
        RevealPhase::Countdown => Some(reveal.remaining_split(local_now_ms)),
        _ => None,
    };

    let response = RevealResponse {
        phase,
        remaining,
        target_ms: reveal.target_ms(),
        offset_ms: state.clock.offset().millis(),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// STAGES HANDLER
// =============================================================================

/// Stage list with unlock state, the active track, and heart slots.
pub async fn stages_handler(State(state): State<AppState>) -> impl IntoResponse {
    let gate = state.gate.read().await;
    let playing = state.playback.read().await.playing().cloned();

    let stages = gate
        .stages()
        .iter()
        .enumerate()
        .map(|(index, stage)| StageJson {
            id: stage.id.to_string(),
            media: stage.media.as_str().to_string(),
            unlocked: gate.is_unlocked(&stage.id),
            playing: playing.as_ref() == Some(&stage.id),
            hearts: hearts_for_stage(index, state.hearts_per_stage),
        })
        .collect();

    let response = StagesResponse {
        stages,
        displayed: gate.displayed().map(|s| s.to_string()),
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// UNLOCK HANDLER
// =============================================================================

/// Attempt a secret against a stage.
pub async fn unlock_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UnlockRequest>,
) -> impl IntoResponse {
    let stage = StageId::new(id);
    let mut gate = state.gate.write().await;

    match gate.attempt_unlock(&stage, &request.secret) {
        Ok((outcome, signals)) => (StatusCode::OK, Json(UnlockResponse::result(outcome, signals))),
        Err(e @ KeepsakeError::UnknownStage(_)) => {
            (StatusCode::NOT_FOUND, Json(UnlockResponse::error(e.to_string())))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(UnlockResponse::error(format!("Unlock failed: {}", e))),
        ),
    }
}

// =============================================================================
// DISPLAY HANDLER
// =============================================================================

/// Move the displayed-stage pointer.
///
/// Locked and unknown stages are silently rejected by the gate; the
/// response reports `displayed: false` and nothing else happens.
pub async fn display_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let stage = StageId::new(id);
    let signals = state.gate.write().await.display_stage(&stage);

    let response = DisplayResponse {
        displayed: !signals.is_empty(),
        signals,
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// PLAYBACK HANDLERS
// =============================================================================

/// Start a stage's media, pausing any other active track first.
///
/// Playback for locked stages is rejected silently — their media is not
/// reachable in the presentation either.
pub async fn play_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let stage = StageId::new(id);

    let unlocked = state.gate.read().await.is_unlocked(&stage);
    let mut playback = state.playback.write().await;

    let signals = if unlocked {
        playback.play(&stage)
    } else {
        Vec::new()
    };

    let response = PlaybackResponse {
        playing: playback.playing().map(|s| s.to_string()),
        signals,
    };

    (StatusCode::OK, Json(response))
}

/// Pause a stage's media. No-op unless it is the active track.
pub async fn pause_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let stage = StageId::new(id);
    let mut playback = state.playback.write().await;

    let signals = if playback.playing() == Some(&stage) {
        playback.pause_all()
    } else {
        Vec::new()
    };

    let response = PlaybackResponse {
        playing: playback.playing().map(|s| s.to_string()),
        signals,
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// MEDIA-ENDED HANDLER
// =============================================================================

/// Report that a stage's media played through to the end.
///
/// Clears the active track and feeds the completion into the gate; a
/// resulting `UnlockScheduled` signal arms the delayed-unlock timer.
pub async fn media_ended_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let stage = StageId::new(id);

    let playback_signals = state.playback.write().await.on_ended(&stage);
    let gate_signals = state.gate.write().await.on_media_completed(&stage);

    for signal in &gate_signals {
        if let GateSignal::UnlockScheduled {
            stage: next,
            after_ms,
        } = signal
        {
            spawn_delayed_unlock(state.clone(), next.clone(), *after_ms);
        }
    }

    let response = MediaEndedResponse {
        playback: playback_signals,
        gate: gate_signals,
    };

    (StatusCode::OK, Json(response))
}

// =============================================================================
// MESSAGE HANDLER
// =============================================================================

/// Next hidden message from the rotating deck.
pub async fn next_message_handler(State(state): State<AppState>) -> impl IntoResponse {
    let message = state
        .deck
        .write()
        .await
        .next_message()
        .map(|m| m.to_string());

    (StatusCode::OK, Json(MessageResponse { message }))
}

// =============================================================================
// DEBUG HANDLER
// =============================================================================

/// Administrative override: unlock every stage immediately.
pub async fn unlock_all_handler(State(state): State<AppState>) -> impl IntoResponse {
    let signals = state.gate.write().await.set_all_unlocked();
    tracing::warn!("debug override: all stages unlocked");

    (StatusCode::OK, Json(SignalsResponse { signals }))
}
