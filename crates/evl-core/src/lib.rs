//! # evl-core — Foundational Types for the Evidence Ledger
//!
//! This crate defines the data model shared by every other crate in the
//! workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `EvidenceId` and `Version`
//!    have validated constructors. A `Version` is never zero; an `EvidenceId`
//!    is never empty.
//!
//! 2. **One digest set shape.** `DigestSet` always carries all four digests
//!    (MD5, SHA-1, SHA-256, SHA-512) as lowercase hex. There is no partial
//!    digest set.
//!
//! 3. **One key codec.** Ledger keys are built and parsed only through
//!    [`key::ledger_key`] and [`key::parse_ledger_key`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `evl-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod identity;
pub mod key;
pub mod record;

// Re-export primary types for ergonomic imports.
pub use digest::{to_hex, DigestAlgorithm, DigestSet};
pub use error::ValidationError;
pub use identity::{EvidenceId, Version};
pub use key::{ledger_key, parse_ledger_key};
pub use record::{EvidenceDraft, EvidenceRecord};
