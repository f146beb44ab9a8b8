//! # Filesystem Ledger
//!
//! Single-node durable ledger: one file per key under a root directory.
//!
//! ## File Naming
//!
//! A key is hex-encoded and the hex split into segments of at most
//! [`SEGMENT_HEX_LEN`] characters. Every segment but the last names a
//! directory; the last names the record file:
//!
//! ```text
//! {root}/{hex[0..128]}/{hex[128..256]}/{hex[256..]}.rec
//! ```
//!
//! Hex-encoding keeps arbitrary identifiers (slashes, dots, non-ASCII) out
//! of path syntax and preserves byte order. Splitting keeps every path
//! component under the common 255-byte file name limit for any valid key.
//! Directories never carry the record extension, so a directory and a
//! record file sharing a segment cannot collide.
//!
//! ## Atomicity
//!
//! `put_new` writes the value to a temporary file in the same directory,
//! syncs it, then publishes it with a no-clobber link. Readers see either
//! no file or the complete value. If the target already exists the link
//! fails with `AlreadyExists`, which surfaces as a write conflict; the
//! check and the publish are a single filesystem operation, so there is no
//! window between them for a second writer.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use evl_core::to_hex;
use tempfile::NamedTempFile;

use crate::backend::{in_range, Ledger};
use crate::error::LedgerError;

/// Extension of committed record files.
const RECORD_EXTENSION: &str = "rec";

/// Maximum hex characters per path component. Even, so no byte is split
/// across components.
const SEGMENT_HEX_LEN: usize = 128;

/// A ledger backed by a directory of immutable files.
#[derive(Debug, Clone)]
pub struct FileLedger {
    root: PathBuf,
}

impl FileLedger {
    /// Open a ledger rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "opened file ledger");
        Ok(Self { root })
    }

    /// Root directory of this ledger.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let hex = to_hex(key.as_bytes());
        let mut path = self.root.clone();
        let mut rest = hex.as_str();
        while rest.len() > SEGMENT_HEX_LEN {
            let (segment, tail) = rest.split_at(SEGMENT_HEX_LEN);
            path.push(segment);
            rest = tail;
        }
        path.push(format!("{rest}.{RECORD_EXTENSION}"));
        path
    }

    /// Collect the hex-encoded keys of every record under `dir`, where
    /// `prefix` is the hex already consumed by the directories above it.
    fn collect_hex_keys(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), LedgerError> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if entry.file_type()?.is_dir() {
                if name.len() == SEGMENT_HEX_LEN && is_hex(name) {
                    Self::collect_hex_keys(&entry.path(), &format!("{prefix}{name}"), out)?;
                }
            } else if let Some(stem) = record_stem(name) {
                out.push(format!("{prefix}{stem}"));
            }
        }
        Ok(())
    }
}

/// Hex stem of a record file name, or `None` for anything else in the
/// directory (temporary files, foreign files).
fn record_stem(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(RECORD_EXTENSION)?.strip_suffix('.')?;
    (stem.len() <= SEGMENT_HEX_LEN && is_hex(stem)).then_some(stem)
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn key_from_hex(hex: &str) -> Option<String> {
    String::from_utf8(decode_hex(hex)?).ok()
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    s.as_bytes()
        .chunks(2)
        .map(|pair| {
            let hi = (pair[0] as char).to_digit(16)?;
            let lo = (pair[1] as char).to_digit(16)?;
            Some((hi * 16 + lo) as u8)
        })
        .collect()
}

impl Ledger for FileLedger {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put_new(&self, key: &str, value: &[u8]) -> Result<(), LedgerError> {
        let target = self.path_for(key);
        let dir = target.parent().unwrap_or(&self.root);
        fs::create_dir_all(dir)?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(value)?;
        tmp.as_file().sync_all()?;
        match tmp.persist_noclobber(&target) {
            Ok(_) => Ok(()),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => Err(LedgerError::Conflict {
                key: key.to_string(),
            }),
            Err(e) => Err(LedgerError::Io(e.error)),
        }
    }

    fn scan(&self, start: &str, end: &str) -> Result<Vec<(String, Vec<u8>)>, LedgerError> {
        let mut hex_keys = Vec::new();
        Self::collect_hex_keys(&self.root, "", &mut hex_keys)?;
        let mut keys: Vec<String> = hex_keys
            .iter()
            .filter_map(|hex| key_from_hex(hex))
            .filter(|key| in_range(key, start, end))
            .collect();
        keys.sort();

        let mut out = Vec::with_capacity(keys.len());
        for key in keys {
            let bytes = fs::read(self.path_for(&key))?;
            out.push((key, bytes));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> (tempfile::TempDir, FileLedger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::open(dir.path().join("ledger")).unwrap();
        (dir, ledger)
    }

    #[test]
    fn open_creates_root() {
        let (_dir, ledger) = ledger();
        assert!(ledger.root().is_dir());
    }

    #[test]
    fn put_new_then_get() {
        let (_dir, ledger) = ledger();
        ledger.put_new("E1_1", b"{\"v\":1}").unwrap();
        assert_eq!(
            ledger.get("E1_1").unwrap().as_deref(),
            Some(&b"{\"v\":1}"[..])
        );
        assert_eq!(ledger.get("E1_2").unwrap(), None);
    }

    #[test]
    fn put_new_refuses_overwrite() {
        let (_dir, ledger) = ledger();
        ledger.put_new("E1_1", b"original").unwrap();
        let err = ledger.put_new("E1_1", b"tampered").unwrap_err();
        assert!(matches!(err, LedgerError::Conflict { .. }));
        assert_eq!(
            ledger.get("E1_1").unwrap().as_deref(),
            Some(&b"original"[..])
        );
    }

    #[test]
    fn keys_with_path_syntax_stay_inside_root() {
        let (_dir, ledger) = ledger();
        ledger.put_new("../escape_1", b"x").unwrap();
        ledger.put_new("a/b_1", b"y").unwrap();
        let names: Vec<String> = fs::read_dir(ledger.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.ends_with(".rec") && !n.contains('/')));
        assert_eq!(ledger.get("a/b_1").unwrap().as_deref(), Some(&b"y"[..]));
    }

    #[test]
    fn scan_orders_keys_and_skips_foreign_files() {
        let (_dir, ledger) = ledger();
        for key in ["b_1", "a_2", "a_1"] {
            ledger.put_new(key, key.as_bytes()).unwrap();
        }
        fs::write(ledger.root().join("notes.txt"), b"ignore me").unwrap();
        fs::write(ledger.root().join("zz.rec"), b"not hex").unwrap();

        let all = ledger.scan("", "").unwrap();
        let keys: Vec<&str> = all.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a_1", "a_2", "b_1"]);
        assert_eq!(all[0].1, b"a_1");

        let bounded = ledger.scan("a_2", "b").unwrap();
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].0, "a_2");
    }

    #[test]
    fn reopen_sees_existing_records() {
        let (dir, ledger) = ledger();
        ledger.put_new("E1_1", b"persisted").unwrap();
        drop(ledger);
        let reopened = FileLedger::open(dir.path().join("ledger")).unwrap();
        assert_eq!(
            reopened.get("E1_1").unwrap().as_deref(),
            Some(&b"persisted"[..])
        );
    }

    #[test]
    fn long_keys_are_split_into_short_components() {
        let (_dir, ledger) = ledger();
        let key = format!("{}_1", "k".repeat(256));
        ledger.put_new(&key, b"long").unwrap();

        let path = ledger.path_for(&key);
        let relative = path.strip_prefix(ledger.root()).unwrap();
        assert_eq!(relative.components().count(), 5);
        assert!(relative
            .components()
            .all(|c| c.as_os_str().len() <= SEGMENT_HEX_LEN + ".rec".len()));

        assert_eq!(ledger.get(&key).unwrap().as_deref(), Some(&b"long"[..]));
        assert_eq!(ledger.get(&format!("{}_2", "k".repeat(256))).unwrap(), None);
        assert!(matches!(
            ledger.put_new(&key, b"again").unwrap_err(),
            LedgerError::Conflict { .. }
        ));
    }

    #[test]
    fn scan_mixes_short_and_nested_keys_in_order() {
        let (_dir, ledger) = ledger();
        // 64-byte keys hex to exactly one full segment.
        let exact = "m".repeat(62) + "_1";
        let long = format!("{}_1", "m".repeat(200));
        for key in ["z_1", long.as_str(), "a_1", exact.as_str()] {
            ledger.put_new(key, key.as_bytes()).unwrap();
        }

        let all = ledger.scan("", "").unwrap();
        let keys: Vec<&str> = all.iter().map(|(k, _)| k.as_str()).collect();
        let mut expected = vec!["a_1", exact.as_str(), long.as_str(), "z_1"];
        expected.sort();
        assert_eq!(keys, expected);
        assert!(all.iter().all(|(k, v)| k.as_bytes() == v.as_slice()));
    }

    #[test]
    fn decode_hex_rejects_garbage() {
        assert_eq!(decode_hex("4142"), Some(b"AB".to_vec()));
        assert_eq!(decode_hex("414"), None);
        assert_eq!(decode_hex("zz"), None);
    }
}
