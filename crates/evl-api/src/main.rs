//! # evl-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the evidence ledger.
//! Configuration comes from `EVL_*` environment variables (see
//! [`AppConfig::from_env`]).

use anyhow::Context;
use evl_api::logging::init_tracing;
use evl_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_tracing(config.log_format, "info");

    let state = AppState::with_config(config).context("failed to open evidence ledger")?;
    evl_api::serve(state).await.context("server terminated")?;

    Ok(())
}
