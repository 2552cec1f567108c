//! # Keepsake - Reveal Server
//!
//! The main binary for the Keepsake gift experience.
//!
//! This application provides:
//! - HTTP REST API server (axum-based) driving the gated reveal
//! - CLI interface for serving, inspecting and checking the setup
//! - One best-effort time sync fetch at startup
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                    apps/keepsake (THE BINARY)                  │
//! │                                                                │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐   │
//! │  │   CLI       │    │   HTTP API  │    │  Time Sync       │   │
//! │  │  (clap)     │    │   (axum)    │    │  (reqwest, once) │   │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘   │
//! │         │                  │                    │              │
//! │         └──────────────────┼────────────────────┘              │
//! │                            ▼                                   │
//! │                   ┌─────────────────┐                          │
//! │                   │  keepsake-core  │                          │
//! │                   │  (THE LOGIC)    │                          │
//! │                   └─────────────────┘                          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! keepsake serve --host 0.0.0.0 --port 8080
//!
//! # Inspect the configured countdown and stages
//! keepsake status
//!
//! # Validate the configuration file
//! keepsake check
//! ```

use clap::Parser;
use keepsake::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — KEEPSAKE_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("KEEPSAKE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "keepsake=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Keepsake startup banner.
fn print_banner() {
    println!(
        r#"
  ♥ ♥ ♥  K E E P S A K E  ♥ ♥ ♥

  Reveal Server v{}

  Four moments • One countdown • No hurry
"#,
        env!("CARGO_PKG_VERSION")
    );
}
