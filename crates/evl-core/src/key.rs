//! # Ledger Key Codec
//!
//! Each evidence version lives under the key `"<evidenceID>_<version>"`.
//! There is no index or counter key: the set of versions of an item is
//! always derived by probing this pattern.
//!
//! Decoding splits at the last `_`. Versions are rendered in decimal with
//! no leading zeros, so the mapping from `(id, version)` to key is
//! injective even when the identifier itself contains underscores.

use crate::identity::{EvidenceId, Version};

/// Separator between the evidence identifier and the version number.
pub const KEY_SEPARATOR: char = '_';

/// Build the ledger key for one evidence version.
pub fn ledger_key(id: &EvidenceId, version: Version) -> String {
    format!("{}{KEY_SEPARATOR}{}", id.as_str(), version.get())
}

/// Split a ledger key into its evidence identifier and version.
///
/// Returns `None` for keys that do not follow the evidence key layout
/// (no separator, empty identifier, non-canonical or zero version).
pub fn parse_ledger_key(key: &str) -> Option<(EvidenceId, Version)> {
    let (id, version) = key.rsplit_once(KEY_SEPARATOR)?;
    if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if version.starts_with('0') {
        return None;
    }
    let version = Version::new(version.parse().ok()?).ok()?;
    let id = EvidenceId::new(id).ok()?;
    Some((id, version))
}
