//! # Keepsake HTTP API Module
//!
//! The presentation adapter: a small axum REST API the static page polls
//! and pokes. The engine lives in `keepsake-core`; this module owns the
//! async plumbing around it — the shared state, the countdown tick task,
//! and the delayed-event feedback loops.
//!
//! ## Endpoints
//!
//! - `GET  /health` - Health check
//! - `GET  /reveal` - Countdown / reveal state
//! - `GET  /stages` - Stage list with unlock state
//! - `POST /stages/{id}/unlock` - Attempt a secret
//! - `POST /stages/{id}/display` - Move the displayed-stage pointer
//! - `POST /stages/{id}/play` - Start a stage's media
//! - `POST /stages/{id}/pause` - Pause playback
//! - `POST /stages/{id}/media-ended` - Report media completion
//! - `GET  /messages/next` - Next hidden message
//! - `POST /debug/unlock-all` - Unlock everything (debug builds of the
//!   config only, admin-key guarded)
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `KEEPSAKE_CORS_ORIGINS`: Comma-separated allowed origins, or "*" for
//!   all (default: localhost only)
//! - `KEEPSAKE_ADMIN_KEY`: If set, `/debug/*` requires this Bearer token

mod auth;
mod handlers;
mod types;

// Re-exports for external use
pub use auth::get_admin_key_from_env;
// Re-export handlers and types for integration tests (via `keepsake::api::*`)
#[allow(unused_imports)]
pub use handlers::{
    display_handler, health_handler, media_ended_handler, next_message_handler, pause_handler,
    play_handler, reveal_handler, stages_handler, unlock_all_handler, unlock_handler,
};
#[allow(unused_imports)]
pub use types::{
    DisplayResponse, HealthResponse, MediaEndedResponse, MessageResponse, PlaybackResponse,
    RevealResponse, SignalsResponse, StageJson, StagesResponse, UnlockRequest, UnlockResponse,
};

use crate::config::KeepsakeConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use chrono::Utc;
use keepsake_core::{
    KeepsakeError, MessageDeck, Playback, ProgressionGate, RevealGate, RevealPhase, RevealSignal,
    StageId, SyncedClock,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state owning both engine components.
///
/// The gate and the reveal machine do not share state; they only share
/// the serialization discipline of these locks.
#[derive(Clone)]
pub struct AppState {
    /// Progression gate (stages, unlock set, displayed pointer).
    pub gate: Arc<RwLock<ProgressionGate>>,
    /// Time-gated reveal machine.
    pub reveal: Arc<RwLock<RevealGate>>,
    /// Single-active-track playback state.
    pub playback: Arc<RwLock<Playback>>,
    /// Rotating hidden-message deck.
    pub deck: Arc<RwLock<MessageDeck>>,
    /// The fixed clock correction for this session.
    pub clock: SyncedClock,
    /// Hidden hearts per stage, for the stage listing.
    pub hearts_per_stage: usize,
    /// Whether `/debug/*` routes are registered.
    pub debug_endpoints: bool,
}

impl AppState {
    /// Build the full engine state from configuration and the startup
    /// clock decision.
    pub fn from_config(
        config: &KeepsakeConfig,
        clock: SyncedClock,
        local_now_ms: i64,
    ) -> Result<Self, KeepsakeError> {
        let gate = ProgressionGate::new(config.gate_config())?;

        let reveal_config = config.reveal_config()?;
        let reveal = if config.countdown.enabled {
            let (reveal, signals) = RevealGate::start(reveal_config, clock, local_now_ms);
            match reveal.phase() {
                RevealPhase::Countdown => {
                    if let Some(RevealSignal::CountdownTick { remaining }) = signals.first() {
                        tracing::info!("countdown running, {} remaining", remaining);
                    }
                }
                _ => tracing::info!("target already passed, revealing immediately"),
            }
            reveal
        } else {
            tracing::info!("countdown disabled, revealing immediately");
            RevealGate::revealed(reveal_config, clock)
        };

        Ok(Self {
            gate: Arc::new(RwLock::new(gate)),
            reveal: Arc::new(RwLock::new(reveal)),
            playback: Arc::new(RwLock::new(Playback::new())),
            deck: Arc::new(RwLock::new(MessageDeck::new(
                config.messages.secret_messages.clone(),
            ))),
            clock,
            hearts_per_stage: config.messages.hearts_per_stage,
            debug_endpoints: config.developer.debug_endpoints,
        })
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `KEEPSAKE_CORS_ORIGINS`.
///
/// - "*": allow all origins (development only)
/// - unset: localhost only (restrictive default)
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("KEEPSAKE_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (KEEPSAKE_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in KEEPSAKE_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => build_localhost_cors(),
    }
}

/// Restrictive CORS layer allowing only localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let localhost_origins = vec![
        "http://localhost:3000".parse::<HeaderValue>().ok(),
        "http://localhost:8080".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:3000".parse::<HeaderValue>().ok(),
        "http://127.0.0.1:8080".parse::<HeaderValue>().ok(),
    ];
    let origins: Vec<HeaderValue> = localhost_origins.into_iter().flatten().collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit - the API only ever receives tiny JSON bodies
/// 4. Admin key - guards `/debug/*` (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/reveal", get(handlers::reveal_handler))
        .route("/stages", get(handlers::stages_handler))
        .route("/stages/{id}/unlock", post(handlers::unlock_handler))
        .route("/stages/{id}/display", post(handlers::display_handler))
        .route("/stages/{id}/play", post(handlers::play_handler))
        .route("/stages/{id}/pause", post(handlers::pause_handler))
        .route(
            "/stages/{id}/media-ended",
            post(handlers::media_ended_handler),
        )
        .route("/messages/next", get(handlers::next_message_handler));

    if state.debug_endpoints {
        if get_admin_key_from_env().is_some() {
            tracing::info!("debug endpoints enabled, admin key required");
        } else {
            tracing::warn!(
                "debug endpoints enabled WITHOUT an admin key - set KEEPSAKE_ADMIN_KEY to guard them"
            );
        }
        router = router.route("/debug/unlock-all", post(handlers::unlock_all_handler));
    }

    // Admin-key middleware only acts on /debug/* paths.
    router = router.layer(axum_middleware::from_fn(auth::admin_key_middleware));

    router
        .layer(axum::extract::DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// BACKGROUND TASKS
// =============================================================================

/// Spawn the countdown tick task.
///
/// Ticks at the configured interval until the countdown finishes, then
/// arms the one-shot celebration timer and exits — the tick is cancelled
/// exactly once and never restarted.
pub fn spawn_countdown_ticker(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval_ms = state.reveal.read().await.tick_interval_ms();
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first interval tick fires immediately; the start signal
        // already covered that instant.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let local_now_ms = Utc::now().timestamp_millis();
            let signals = state.reveal.write().await.on_tick(local_now_ms);
            for signal in signals {
                match signal {
                    RevealSignal::CountdownTick { remaining } => {
                        tracing::debug!("countdown tick, {} remaining", remaining);
                    }
                    RevealSignal::CountdownFinished { reveal_after_ms } => {
                        tracing::info!("countdown finished, revealing in {} ms", reveal_after_ms);
                        spawn_celebration_timer(state.clone(), reveal_after_ms);
                        return;
                    }
                    RevealSignal::Revealed => {}
                }
            }
        }
    })
}

/// One-shot timer covering the celebration and fade before the reveal.
fn spawn_celebration_timer(state: AppState, reveal_after_ms: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(reveal_after_ms)).await;
        let signals = state.reveal.write().await.on_celebration_done();
        if signals
            .iter()
            .any(|s| matches!(s, RevealSignal::Revealed))
        {
            tracing::info!("content revealed");
        }
    });
}

/// One-shot timer applying a scheduled next-stage unlock.
pub fn spawn_delayed_unlock(state: AppState, stage: StageId, after_ms: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(after_ms)).await;
        let signals = state.gate.write().await.on_unlock_due(&stage);
        if !signals.is_empty() {
            tracing::info!("stage {} unlocked after media completion", stage);
        }
    });
}

/// One-shot timer displaying the start stage shortly after startup,
/// once the content is visible.
pub fn spawn_auto_display(state: AppState, stage: StageId, delay_ms: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        if !state.reveal.read().await.is_revealed() {
            return;
        }
        let signals = state.gate.write().await.display_stage(&stage);
        if !signals.is_empty() {
            tracing::debug!("auto-displayed stage {}", stage);
        }
    });
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), KeepsakeError> {
    if state.reveal.read().await.phase() == RevealPhase::Countdown {
        // Detached on purpose: the ticker ends itself when the countdown
        // finishes.
        let _ticker = spawn_countdown_ticker(state.clone());
    }

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| KeepsakeError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Keepsake HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| KeepsakeError::IoError(format!("Server error: {}", e)))
}
