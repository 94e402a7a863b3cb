//! pgbrowse - PostgreSQL browsing from the command line
//!
//! This is the main entry point for the binary.
//! The actual logic is in the library modules for better testability.

use anyhow::{Context, Result};
use clap::Parser;
use pgbrowse::PgBrowseError;
use pgbrowse::cli::{self, Cli};
use pgbrowse::config::{EnvSecretStore, ProfileStore, settings::load_settings};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Cli::parse();
    let settings = load_settings().context("loading ~/.pgbrowse/config.toml")?;

    // RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();

    let profiles = ProfileStore::open_default().context("locating connection profiles")?;
    let mut stdout = std::io::stdout().lock();

    match cli::run(args, &settings, &profiles, &EnvSecretStore, &mut stdout).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e);
            if let PgBrowseError::Database(db) = &e {
                if let Some(hint) = db.recovery_suggestion() {
                    eprintln!("hint: {}", hint);
                }
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
