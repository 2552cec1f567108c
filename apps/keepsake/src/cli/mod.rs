//! # Keepsake CLI Module
//!
//! This module implements the CLI interface for Keepsake.
//!
//! ## Available Commands
//!
//! - `serve` - Start the HTTP server
//! - `status` - Show countdown and stage status
//! - `check` - Validate the configuration file

mod commands;

use clap::{Parser, Subcommand};
use keepsake_core::KeepsakeError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Keepsake - Reveal Server
///
/// A password-gated, time-gated reveal of four moments, served to a
/// static page. The engine holds no persistent state; every restart is a
/// fresh session.
#[derive(Parser, Debug)]
#[command(name = "keepsake")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short = 'C', long, global = true, default_value = "keepsake.toml")]
    pub config: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Show countdown and stage status
    Status,

    /// Validate the configuration file
    Check,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), KeepsakeError> {
    match cli.command {
        Some(Commands::Serve { host, port }) => cmd_serve(&cli.config, &host, port).await,
        Some(Commands::Status) => cmd_status(&cli.config, cli.json_mode),
        Some(Commands::Check) => cmd_check(&cli.config),
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.config, cli.json_mode)
        }
    }
}
