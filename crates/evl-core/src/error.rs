//! # Error Types
//!
//! Validation errors for the domain primitives. All errors use `thiserror`
//! for derive-based `Display` and `Error` implementations.

use thiserror::Error;

use crate::digest::DigestAlgorithm;

/// A domain value was rejected by its validated constructor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Evidence identifiers must not be empty.
    #[error("evidence id must not be empty")]
    EmptyEvidenceId,

    /// Evidence identifier exceeds the maximum length.
    #[error("evidence id is {len} bytes long (max {max})")]
    EvidenceIdTooLong {
        /// Actual length in bytes.
        len: usize,
        /// Maximum permitted length in bytes.
        max: usize,
    },

    /// Evidence identifier contains an ASCII control character.
    #[error("evidence id contains a control character at byte {position}")]
    EvidenceIdControlChar {
        /// Byte offset of the offending character.
        position: usize,
    },

    /// Versions start at 1.
    #[error("version must be at least 1")]
    ZeroVersion,

    /// A digest string is not lowercase hex of the algorithm's length.
    #[error("malformed {algorithm} digest: {reason}")]
    MalformedDigest {
        /// Algorithm whose digest was rejected.
        algorithm: DigestAlgorithm,
        /// Why it was rejected.
        reason: String,
    },
}
