//! # Serve Subcommand
//!
//! Runs the HTTP gateway in the foreground. Settings come from the
//! `EVL_*` environment first; flags given here override them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use evl_api::state::{AppConfig, AppState};

use crate::EXIT_OK;

/// Arguments for `evl serve`.
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Listen port. Overrides `EVL_PORT`.
    #[arg(long)]
    pub port: Option<u16>,
    /// Filesystem ledger root. Overrides `EVL_LEDGER_DIR`.
    #[arg(long)]
    pub ledger_dir: Option<PathBuf>,
}

impl ServeArgs {
    /// Apply flag overrides on top of `base`.
    pub fn config(&self, base: AppConfig) -> AppConfig {
        AppConfig {
            port: self.port.unwrap_or(base.port),
            ledger_dir: self.ledger_dir.clone().or(base.ledger_dir),
            ..base
        }
    }
}

/// Serve until Ctrl-C.
pub fn run_serve(args: &ServeArgs) -> Result<u8> {
    let config = args.config(AppConfig::from_env());
    let state = AppState::with_config(config).context("failed to open evidence ledger")?;

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime
        .block_on(evl_api::serve(state))
        .context("server terminated")?;
    Ok(EXIT_OK)
}
