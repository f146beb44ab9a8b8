//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor.
//!
//! The gateway owns no evidence data of its own. Everything lives in the
//! injected ledger; `AppState` only carries the store handle over that
//! ledger and the runtime configuration.

use std::path::PathBuf;
use std::sync::Arc;

use evl_ledger::{EvidenceStore, FileLedger, Ledger, LedgerError, MemoryLedger};

use crate::logging::LogFormat;

/// Ledger handle shared across handlers and blocking tasks.
pub type SharedLedger = Arc<dyn Ledger>;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9099;

/// Default allowed browser origin.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Default number of extra append attempts after a write conflict.
pub const DEFAULT_APPEND_RETRIES: u32 = 3;

/// Default request body limit: 64 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Root of the filesystem ledger. `None` keeps evidence in memory.
    pub ledger_dir: Option<PathBuf>,
    pub cors_origin: String,
    /// Extra append attempts after a write conflict.
    pub append_retries: u32,
    pub max_upload_bytes: usize,
    pub metrics_enabled: bool,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            ledger_dir: None,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            append_retries: DEFAULT_APPEND_RETRIES,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            metrics_enabled: true,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Build configuration from `EVL_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// Unset variables take their defaults. Unparseable values also fall
    /// back to the default, with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or("EVL_PORT", &lookup, defaults.port),
            ledger_dir: lookup("EVL_LEDGER_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
            cors_origin: lookup("EVL_CORS_ORIGIN").unwrap_or(defaults.cors_origin),
            append_retries: parse_or("EVL_APPEND_RETRIES", &lookup, defaults.append_retries),
            max_upload_bytes: parse_or("EVL_MAX_UPLOAD_BYTES", &lookup, defaults.max_upload_bytes),
            // Anything other than "false" leaves metrics on.
            metrics_enabled: lookup("EVL_METRICS_ENABLED")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.metrics_enabled),
            log_format: parse_or("EVL_LOG_FORMAT", &lookup, defaults.log_format),
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &str,
    lookup: &impl Fn(&str) -> Option<String>,
    default: T,
) -> T {
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(variable = name, value = %raw, "ignoring unparseable setting");
            default
        }),
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub store: EvidenceStore<SharedLedger>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// In-memory ledger with default configuration.
    pub fn new() -> Self {
        Self::with_ledger(AppConfig::default(), Arc::new(MemoryLedger::new()))
    }

    /// Open the ledger the configuration names: a [`FileLedger`] when
    /// `ledger_dir` is set, otherwise a fresh [`MemoryLedger`].
    pub fn with_config(config: AppConfig) -> Result<Self, LedgerError> {
        let ledger: SharedLedger = match &config.ledger_dir {
            Some(dir) => {
                tracing::info!(root = %dir.display(), "using filesystem ledger");
                Arc::new(FileLedger::open(dir)?)
            }
            None => {
                tracing::warn!("EVL_LEDGER_DIR not set; evidence is kept in memory only");
                Arc::new(MemoryLedger::new())
            }
        };
        Ok(Self::with_ledger(config, ledger))
    }

    /// Use a caller-supplied ledger.
    pub fn with_ledger(config: AppConfig, ledger: SharedLedger) -> Self {
        Self {
            store: EvidenceStore::new(ledger),
            config: Arc::new(config),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
