//! # In-Memory Ledger
//!
//! Ordered map behind a `parking_lot::RwLock`. Used by tests and by the
//! gateway when no ledger directory is configured. Contents are lost on
//! restart.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::backend::Ledger;
use crate::error::LedgerError;

/// Thread-safe, cloneable in-memory ledger.
///
/// Clones share the same data. The lock is never held across an `.await`;
/// `put_new` does its existence check and insert under one write guard.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    data: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the ledger holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Ledger for MemoryLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put_new(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        let mut guard = self.data.write();
        if guard.contains_key(key) {
            return Err(LedgerError::Conflict {
                key: key.to_string(),
            });
        }
        guard.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else if end <= start {
            return Ok(Vec::new());
        } else {
            Bound::Excluded(end)
        };
        let guard = self.data.read();
        Ok(guard
            .range::<str, _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_absent_is_none() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.get("E1_1").unwrap(), None);
        assert!(ledger.is_empty());
    }

    #[test]
    fn put_new_then_get() {
        let ledger = MemoryLedger::new();
        ledger.put_new("E1_1", b"v1").unwrap();
        assert_eq!(ledger.get("E1_1").unwrap().as_deref(), Some(&b"v1"[..]));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn put_new_refuses_overwrite() {
        let ledger = MemoryLedger::new();
        ledger.put_new("E1_1", b"original").unwrap();
        let err = ledger.put_new("E1_1", b"tampered").unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { ref key } if key == "E1_1"));
        assert_eq!(
            ledger.get("E1_1").unwrap().as_deref(),
            Some(&b"original"[..])
        );
    }

    #[test]
    fn clones_share_data() {
        let a = MemoryLedger::new();
        let b = a.clone();
        a.put_new("k", b"v").unwrap();
        assert!(b.get("k").unwrap().is_some());
    }

    #[test]
    fn scan_is_ordered_and_bounded() {
        let ledger = MemoryLedger::new();
        for key in ["b_1", "a_2", "a_1", "c_1"] {
            ledger.put_new(key, key.as_bytes()).unwrap();
        }
        let all: Vec<String> = ledger.scan("", "").unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(all, vec!["a_1", "a_2", "b_1", "c_1"]);

        let mid: Vec<String> = ledger
            .scan("a_2", "c_1")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(mid, vec!["a_2", "b_1"]);

        assert!(ledger.scan("c", "a").unwrap().is_empty());
        assert!(ledger.scan("b", "b").unwrap().is_empty());
    }
}
