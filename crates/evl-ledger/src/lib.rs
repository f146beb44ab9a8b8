//! # evl-ledger — Versioned Evidence Record Store
//!
//! Layers the evidence versioning scheme on top of a plain key-value
//! ledger. The ledger is an injected collaborator ([`Ledger`]); the store
//! ([`EvidenceStore`]) owns version assignment and never caches state
//! between calls.
//!
//! ## Versioning Scheme
//!
//! Version `n` of evidence `id` lives under key `"{id}_{n}"`. The latest
//! version is found by probing `id_1`, `id_2`, … until the first absent
//! key. No counter record exists, so there is nothing that can drift out
//! of sync with the records themselves.
//!
//! ## Append-Only Guarantee
//!
//! Every write goes through [`Ledger::put_new`], which refuses to
//! overwrite an existing key. Two appenders racing for the same version
//! cannot both win: the loser receives [`LedgerError::Conflict`] and may
//! retry with a refreshed latest version.
//!
//! ## Backends
//!
//! - [`MemoryLedger`] — ordered in-memory map, for tests and development.
//! - [`FileLedger`] — one file per key, published atomically.

pub mod backend;
pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use backend::Ledger;
pub use error::{LedgerError, StoreError};
pub use file::FileLedger;
pub use memory::MemoryLedger;
pub use store::EvidenceStore;
