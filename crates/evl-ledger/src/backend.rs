//! # Ledger Backend Trait
//!
//! The minimal key-value contract the record store needs from the
//! underlying ledger: atomic point reads, put-if-absent writes and ordered
//! range scans. Consistency and replication are the backend's business.

use std::sync::Arc;

use crate::error::LedgerError;

/// A transactional key-value ledger.
///
/// # Contract
///
/// - `get` is atomic per key: it never observes a partially written value.
/// - `put_new` writes only if `key` is absent, and fails with
///   [`LedgerError::Conflict`] otherwise. The check and the write are one
///   atomic step. This is what makes concurrent appends safe.
/// - `scan` returns entries with `start <= key < end`, ascending by key.
///   An empty `end` means "no upper bound", so `scan("", "")` enumerates
///   the whole ledger.
pub trait Ledger: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Store `value` under `key` if and only if `key` is absent.
    fn put_new(&self, key: &str, value: &[u8]) -> Result<(), LedgerError>;

    /// Enumerate entries in `[start, end)`; empty `end` is unbounded.
    fn scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        (**self).get(key)
    }

    fn put_new(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        (**self).put_new(key, value)
    }

    fn scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        (**self).scan(start, end)
    }
}

/// True when `key` falls inside the `[start, end)` scan range.
pub(crate) fn in_range(key: &str, start: &str, end: &str) -> bool {
    key >= start && (end.is_empty() || key < end)
}
