//! Integration tests for the Keepsake HTTP API.
//!
//! Uses axum-test to exercise the handlers without starting a real
//! server. The countdown tests drive the real tick task with shortened
//! intervals.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum_test::TestServer;
use chrono::Utc;
use keepsake::api::{
    AppState, DisplayResponse, HealthResponse, MediaEndedResponse, MessageResponse,
    PlaybackResponse, RevealResponse, SignalsResponse, StagesResponse, UnlockResponse,
    create_router, spawn_auto_display, spawn_countdown_ticker,
};
use keepsake::config::KeepsakeConfig;
use keepsake_core::{
    AttemptOutcome, GateSignal, MessageDeck, Playback, ProgressionGate, RevealConfig, RevealGate,
    RevealPhase, StageId, SyncedClock,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

/// Mutex to serialize auth tests since they modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct AuthGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for AuthGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no
        // concurrent env access.
        unsafe { std::env::remove_var("KEEPSAKE_ADMIN_KEY") };
    }
}

/// A config with the countdown disabled and short delays, for gate tests.
fn base_config() -> KeepsakeConfig {
    let mut config = KeepsakeConfig::default();
    config.countdown.enabled = false;
    config.behavior.unlock_delay_ms = 25;
    config.behavior.auto_display_start = false;
    config
}

fn state_from(config: &KeepsakeConfig) -> AppState {
    let local_now_ms = Utc::now().timestamp_millis();
    AppState::from_config(config, SyncedClock::local_only(), local_now_ms).expect("state")
}

fn server_from(config: &KeepsakeConfig) -> (TestServer, AppState) {
    let state = state_from(config);
    let server = TestServer::new(create_router(state.clone())).unwrap();
    (server, state)
}

fn create_test_server() -> (TestServer, AppState) {
    server_from(&base_config())
}

/// State with a live countdown, shortened for test pacing: the target is
/// `target_in_ms` ahead, ticking every 20 ms, 40 ms of celebration+fade.
fn countdown_state(target_in_ms: i64) -> AppState {
    let config = base_config();
    let clock = SyncedClock::local_only();
    let local_now_ms = Utc::now().timestamp_millis();
    let (reveal, _) = RevealGate::start(
        RevealConfig {
            target_ms: local_now_ms + target_in_ms,
            tick_interval_ms: 20,
            celebration_ms: 30,
            fade_ms: 10,
        },
        clock,
        local_now_ms,
    );

    AppState {
        gate: Arc::new(RwLock::new(
            ProgressionGate::new(config.gate_config()).expect("gate"),
        )),
        reveal: Arc::new(RwLock::new(reveal)),
        playback: Arc::new(RwLock::new(Playback::new())),
        deck: Arc::new(RwLock::new(MessageDeck::new(Vec::new()))),
        clock,
        hearts_per_stage: config.messages.hearts_per_stage,
        debug_endpoints: false,
    }
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _state) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// STAGES ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_stages_initial_state() {
    let (server, _state) = create_test_server();

    let response = server.get("/stages").await;

    response.assert_status_ok();
    let stages: StagesResponse = response.json();
    assert_eq!(stages.stages.len(), 4);
    assert_eq!(stages.displayed, None);

    let unlocked: Vec<&str> = stages
        .stages
        .iter()
        .filter(|s| s.unlocked)
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(unlocked, ["morning"]);

    // Every stage carries heart slots for the easter-egg layer.
    assert!(stages.stages.iter().all(|s| !s.hearts.is_empty()));
}

// =============================================================================
// UNLOCK ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_unlock_wrong_secret_changes_nothing() {
    let (server, _state) = create_test_server();

    let response = server
        .post("/stages/daytime/unlock")
        .json(&json!({ "secret": "guess" }))
        .await;

    response.assert_status_ok();
    let unlock: UnlockResponse = response.json();
    assert_eq!(unlock.outcome, Some(AttemptOutcome::WrongSecret));
    assert!(matches!(
        unlock.signals.as_slice(),
        [GateSignal::SecretWrong { clear_after_ms, .. }] if *clear_after_ms == 3000
    ));

    let stages: StagesResponse = server.get("/stages").await.json();
    assert!(!stages.stages[1].unlocked);
}

#[tokio::test]
async fn test_unlock_mixed_case_secret_succeeds() {
    let (server, _state) = create_test_server();

    let response = server
        .post("/stages/daytime/unlock")
        .json(&json!({ "secret": "  ToGeThEr " }))
        .await;

    response.assert_status_ok();
    let unlock: UnlockResponse = response.json();
    assert_eq!(unlock.outcome, Some(AttemptOutcome::Unlocked));
    assert_eq!(unlock.signals.len(), 2);

    let stages: StagesResponse = server.get("/stages").await.json();
    assert!(stages.stages[1].unlocked);
    assert_eq!(stages.displayed.as_deref(), Some("daytime"));
}

#[tokio::test]
async fn test_unlock_is_idempotent() {
    let (server, _state) = create_test_server();

    server
        .post("/stages/daytime/unlock")
        .json(&json!({ "secret": "together" }))
        .await;
    let second: UnlockResponse = server
        .post("/stages/daytime/unlock")
        .json(&json!({ "secret": "together" }))
        .await
        .json();
    assert_eq!(second.outcome, Some(AttemptOutcome::AlreadyUnlocked));
    assert!(second.signals.is_empty());
}

#[tokio::test]
async fn test_unlock_hidden_stage_is_rejected_silently() {
    let (server, _state) = create_test_server();

    let response = server
        .post("/stages/night/unlock")
        .json(&json!({ "secret": "stars" }))
        .await;

    response.assert_status_ok();
    let unlock: UnlockResponse = response.json();
    assert_eq!(unlock.outcome, Some(AttemptOutcome::Hidden));
    assert!(unlock.signals.is_empty());

    let stages: StagesResponse = server.get("/stages").await.json();
    assert!(!stages.stages[3].unlocked);
}

#[tokio::test]
async fn test_unlock_unknown_stage_is_not_found() {
    let (server, _state) = create_test_server();

    let response = server
        .post("/stages/midnight/unlock")
        .json(&json!({ "secret": "anything" }))
        .await;

    response.assert_status_not_found();
    let unlock: UnlockResponse = response.json();
    assert!(unlock.error.is_some());
}

// =============================================================================
// DISPLAY ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_display_locked_stage_is_a_no_op() {
    let (server, _state) = create_test_server();

    let display: DisplayResponse = server.post("/stages/night/display").await.json();
    assert!(!display.displayed);
    assert!(display.signals.is_empty());

    let stages: StagesResponse = server.get("/stages").await.json();
    assert_eq!(stages.displayed, None);
}

#[tokio::test]
async fn test_display_unlocked_stage_moves_the_pointer() {
    let (server, _state) = create_test_server();

    let display: DisplayResponse = server.post("/stages/morning/display").await.json();
    assert!(display.displayed);

    let stages: StagesResponse = server.get("/stages").await.json();
    assert_eq!(stages.displayed.as_deref(), Some("morning"));
}

#[tokio::test]
async fn test_auto_display_after_reveal() {
    let (server, state) = create_test_server();

    spawn_auto_display(state.clone(), StageId::new("morning"), 10);
    tokio::time::sleep(Duration::from_millis(150)).await;

    let stages: StagesResponse = server.get("/stages").await.json();
    assert_eq!(stages.displayed.as_deref(), Some("morning"));
}

// =============================================================================
// MEDIA PROGRESSION TESTS
// =============================================================================

#[tokio::test]
async fn test_media_completion_unlocks_the_next_stage_after_the_delay() {
    let (server, _state) = create_test_server();

    let response = server.post("/stages/morning/media-ended").await;
    response.assert_status_ok();
    let ended: MediaEndedResponse = response.json();
    assert!(matches!(
        ended.gate.as_slice(),
        [GateSignal::UnlockScheduled { stage, after_ms }]
            if stage == &StageId::new("daytime") && *after_ms == 25
    ));

    // Not yet: the delay has not elapsed.
    let stages: StagesResponse = server.get("/stages").await.json();
    assert!(!stages.stages[1].unlocked);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let stages: StagesResponse = server.get("/stages").await.json();
    assert!(stages.stages[1].unlocked, "daytime should have unlocked");
    assert!(!stages.stages[2].unlocked, "evening must stay locked");
    assert!(!stages.stages[3].unlocked, "night must stay locked");
}

#[tokio::test]
async fn test_repeated_media_completion_schedules_once() {
    let (server, _state) = create_test_server();

    let first: MediaEndedResponse = server.post("/stages/morning/media-ended").await.json();
    assert_eq!(first.gate.len(), 1);

    let second: MediaEndedResponse = server.post("/stages/morning/media-ended").await.json();
    assert!(second.gate.is_empty());
}

#[tokio::test]
async fn test_media_completion_with_progression_disabled() {
    let mut config = base_config();
    config.behavior.progression = false;
    let (server, _state) = server_from(&config);

    let ended: MediaEndedResponse = server.post("/stages/morning/media-ended").await.json();
    assert!(ended.gate.is_empty());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let stages: StagesResponse = server.get("/stages").await.json();
    assert!(!stages.stages[1].unlocked);
}

// =============================================================================
// PLAYBACK ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_playback_is_a_singleton() {
    let (server, _state) = create_test_server();

    server
        .post("/stages/daytime/unlock")
        .json(&json!({ "secret": "together" }))
        .await;

    let play: PlaybackResponse = server.post("/stages/morning/play").await.json();
    assert_eq!(play.playing.as_deref(), Some("morning"));

    // Starting another stage pauses the first.
    let play: PlaybackResponse = server.post("/stages/daytime/play").await.json();
    assert_eq!(play.playing.as_deref(), Some("daytime"));
    assert_eq!(play.signals.len(), 2);

    let stages: StagesResponse = server.get("/stages").await.json();
    assert!(stages.stages[1].playing);
    assert!(!stages.stages[0].playing);
}

#[tokio::test]
async fn test_playback_of_locked_stage_is_rejected() {
    let (server, _state) = create_test_server();

    let play: PlaybackResponse = server.post("/stages/night/play").await.json();
    assert_eq!(play.playing, None);
    assert!(play.signals.is_empty());
}

#[tokio::test]
async fn test_pause_only_affects_the_active_track() {
    let (server, _state) = create_test_server();

    server.post("/stages/morning/play").await;

    // Pausing a different stage is a no-op.
    let pause: PlaybackResponse = server.post("/stages/night/pause").await.json();
    assert_eq!(pause.playing.as_deref(), Some("morning"));

    let pause: PlaybackResponse = server.post("/stages/morning/pause").await.json();
    assert_eq!(pause.playing, None);
}

// =============================================================================
// MESSAGE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_messages_rotate_through_the_deck() {
    let mut config = base_config();
    config.messages.secret_messages = vec!["first".to_string(), "second".to_string()];
    let (server, _state) = server_from(&config);

    let first: MessageResponse = server.get("/messages/next").await.json();
    let second: MessageResponse = server.get("/messages/next").await.json();
    let third: MessageResponse = server.get("/messages/next").await.json();

    assert_eq!(first.message.as_deref(), Some("first"));
    assert_eq!(second.message.as_deref(), Some("second"));
    assert_eq!(third.message.as_deref(), Some("first"));
}

// =============================================================================
// REVEAL ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_reveal_with_countdown_disabled() {
    let (server, _state) = create_test_server();

    let reveal: RevealResponse = server.get("/reveal").await.json();
    assert_eq!(reveal.phase, RevealPhase::Revealed);
    assert_eq!(reveal.remaining, None);
    assert_eq!(reveal.offset_ms, 0);
}

#[tokio::test]
async fn test_reveal_past_target_skips_the_countdown() {
    let state = countdown_state(-1000);
    let server = TestServer::new(create_router(state)).unwrap();

    let reveal: RevealResponse = server.get("/reveal").await.json();
    assert_eq!(reveal.phase, RevealPhase::Revealed);
    assert_eq!(reveal.remaining, None);
}

#[tokio::test]
async fn test_reveal_future_target_counts_down() {
    let state = countdown_state(3_600_000);
    let server = TestServer::new(create_router(state)).unwrap();

    let reveal: RevealResponse = server.get("/reveal").await.json();
    assert_eq!(reveal.phase, RevealPhase::Countdown);
    let remaining = reveal.remaining.expect("counting down");
    assert_eq!(remaining.days, 0);
    assert!(remaining.minutes > 50 || remaining.hours == 1);
}

#[tokio::test]
async fn test_countdown_runs_to_the_reveal() {
    let state = countdown_state(250);
    let server = TestServer::new(create_router(state.clone())).unwrap();

    let _ticker = spawn_countdown_ticker(state.clone());

    let reveal: RevealResponse = server.get("/reveal").await.json();
    assert_eq!(reveal.phase, RevealPhase::Countdown);

    tokio::time::sleep(Duration::from_millis(800)).await;

    let reveal: RevealResponse = server.get("/reveal").await.json();
    assert_eq!(reveal.phase, RevealPhase::Revealed);
    assert_eq!(reveal.remaining, None);
}

// =============================================================================
// DEBUG ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_debug_route_absent_by_default() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: env access serialized by AUTH_TEST_MUTEX.
    unsafe { std::env::remove_var("KEEPSAKE_ADMIN_KEY") };
    let (server, _state) = create_test_server();

    let response = server.post("/debug/unlock-all").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_debug_unlock_all_without_key_configured() {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let _cleanup = AuthGuard { _guard: guard };
    // SAFETY: env access serialized by AUTH_TEST_MUTEX.
    unsafe { std::env::remove_var("KEEPSAKE_ADMIN_KEY") };

    let mut config = base_config();
    config.developer.debug_endpoints = true;
    let (server, _state) = server_from(&config);

    let response = server.post("/debug/unlock-all").await;
    response.assert_status_ok();
    let signals: SignalsResponse = response.json();
    assert_eq!(signals.signals.len(), 3);

    let stages: StagesResponse = server.get("/stages").await.json();
    assert!(stages.stages.iter().all(|s| s.unlocked));
}

#[tokio::test]
async fn test_debug_unlock_all_requires_the_admin_key() {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let _cleanup = AuthGuard { _guard: guard };
    // SAFETY: env access serialized by AUTH_TEST_MUTEX.
    unsafe { std::env::set_var("KEEPSAKE_ADMIN_KEY", "test-admin-key") };

    let mut config = base_config();
    config.developer.debug_endpoints = true;
    let (server, _state) = server_from(&config);

    let response = server.post("/debug/unlock-all").await;
    response.assert_status_unauthorized();

    let response = server
        .post("/debug/unlock-all")
        .authorization_bearer("wrong-key")
        .await;
    response.assert_status_unauthorized();

    let response = server
        .post("/debug/unlock-all")
        .authorization_bearer("test-admin-key")
        .await;
    response.assert_status_ok();

    // Non-debug routes stay open regardless of the key.
    server.get("/health").await.assert_status_ok();
}
