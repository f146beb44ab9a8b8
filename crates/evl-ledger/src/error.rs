//! # Ledger and Store Error Types
//!
//! `LedgerError` is what a backend reports. `StoreError` is what the record
//! store reports to its callers; every variant maps to one stable kind tag
//! via [`StoreError::kind`].

use evl_core::{EvidenceId, ValidationError, Version};
use thiserror::Error;

/// Errors reported by a [`Ledger`](crate::Ledger) backend.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// `put_new` refused to overwrite an existing key.
    #[error("write conflict: key {key:?} already exists")]
    Conflict {
        /// The contested key.
        key: String,
    },

    /// I/O error in a filesystem-backed ledger.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("ledger backend error: {0}")]
    Backend(String),
}

/// Errors from [`EvidenceStore`](crate::EvidenceStore) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No versions exist for the evidence item, or the requested version
    /// is beyond the latest one.
    #[error("evidence {id} not found{}", at_version(.version))]
    NotFound {
        /// Requested evidence item.
        id: EvidenceId,
        /// Requested version, if a specific one was asked for.
        version: Option<Version>,
    },

    /// The ledger failed to read or write.
    #[error("storage error: {0}")]
    Storage(#[from] LedgerError),

    /// A record could not be serialized for writing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value is not a valid record for the key it lives under.
    #[error("corrupt record under key {key:?}: {reason}")]
    Corrupt {
        /// Ledger key holding the bad value.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The request carried an invalid identifier or version.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),
}

fn at_version(version: &Option<Version>) -> String {
    version.map(|v| format!(" at version {v}")).unwrap_or_default()
}

impl StoreError {
    /// Stable machine-readable tag for this error.
    ///
    /// Write conflicts refine `STORAGE_ERROR` to `WRITE_CONFLICT` so callers
    /// can tell a lost race (retryable) from a failed backend.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Storage(LedgerError::Conflict { .. }) => "WRITE_CONFLICT",
            Self::Storage(_) | Self::Serialization(_) | Self::Corrupt { .. } => "STORAGE_ERROR",
            Self::InvalidInput(_) => "VALIDATION_ERROR",
        }
    }

    /// True when this error is a lost append race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(LedgerError::Conflict { .. }))
    }
}
