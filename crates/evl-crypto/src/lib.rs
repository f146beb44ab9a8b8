//! # evl-crypto — Digest Engine
//!
//! Computes the [`DigestSet`](evl_core::DigestSet) an evidence version
//! commits to. One read loop feeds four independent hash accumulators
//! (MD5, SHA-1, SHA-256, SHA-512), so the source is consumed exactly once
//! and all four digests are guaranteed to cover the same bytes.
//!
//! ## Entry Points
//!
//! - [`compute_digests`] — drain any `std::io::Read` and return the set.
//! - [`MultiDigest`] — incremental `update` / `finalize` accumulator for
//!   callers that receive content in chunks (e.g. multipart uploads).
//!
//! ## Crate Policy
//!
//! - Depends only on `evl-core` internally.
//! - All-or-nothing: a read failure returns an error and no digests.
//! - No mocking of hash functions in tests. All tests use real digests
//!   checked against published reference vectors.

pub mod digest;
pub mod error;

pub use digest::{compute_digests, compute_file_digests, MultiDigest, READ_BUFFER_SIZE};
pub use error::DigestError;
