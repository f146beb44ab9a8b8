//! # Digest Error Types
//!
//! Structured errors for the digest engine.

use thiserror::Error;

/// Errors from digest computation.
#[derive(Error, Debug)]
pub enum DigestError {
    /// The content stream could not be fully read. No digests were produced.
    #[error("content stream read failed after {bytes_read} bytes: {source}")]
    IoFailure {
        /// Bytes successfully consumed before the failure.
        bytes_read: u64,
        /// The underlying read error.
        #[source]
        source: std::io::Error,
    },
}

impl DigestError {
    /// Stable machine-readable tag for this error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::IoFailure { .. } => "IO_FAILURE",
        }
    }
}
