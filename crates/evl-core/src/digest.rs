//! # Digest Set — Multi-Algorithm Content Fingerprint
//!
//! Defines `DigestAlgorithm` and `DigestSet`, the fingerprint every evidence
//! version commits to. A digest set is produced by the digest engine in
//! `evl-crypto` from a single pass over the submitted content, so all four
//! digests always describe the same bytes.
//!
//! ## Serialized Form
//!
//! The four digests serialize as `md5Hash`, `sha1Hash`, `sha256Hash` and
//! `sha512Hash`, matching the evidence record layout stored on the ledger.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A hash algorithm contributing to a [`DigestSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5 (128-bit). Kept for compatibility with forensic tooling.
    Md5,
    /// SHA-1 (160-bit).
    Sha1,
    /// SHA-256 (256-bit).
    Sha256,
    /// SHA-512 (512-bit).
    Sha512,
}

impl DigestAlgorithm {
    /// Every algorithm in digest-set order.
    pub const ALL: [DigestAlgorithm; 4] = [Self::Md5, Self::Sha1, Self::Sha256, Self::Sha512];

    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded digest in characters.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four-algorithm fingerprint of one piece of content.
///
/// Each field holds the lowercase hex rendering of the digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DigestSet {
    /// MD5 digest, 32 hex chars.
    #[serde(rename = "md5Hash")]
    pub md5: String,
    /// SHA-1 digest, 40 hex chars.
    #[serde(rename = "sha1Hash")]
    pub sha1: String,
    /// SHA-256 digest, 64 hex chars.
    #[serde(rename = "sha256Hash")]
    pub sha256: String,
    /// SHA-512 digest, 128 hex chars.
    #[serde(rename = "sha512Hash")]
    pub sha512: String,
}

impl DigestSet {
    /// Build a digest set from hex strings, checking each against its
    /// algorithm's expected length and alphabet.
    ///
    /// Uppercase input is normalized to lowercase.
    pub fn from_hex(
        md5: &str,
        sha1: &str,
        sha256: &str,
        sha512: &str,
    ) -> Result<Self, ValidationError> {
        let set = Self {
            md5: md5.trim().to_ascii_lowercase(),
            sha1: sha1.trim().to_ascii_lowercase(),
            sha256: sha256.trim().to_ascii_lowercase(),
            sha512: sha512.trim().to_ascii_lowercase(),
        };
        set.validate()?;
        Ok(set)
    }

    /// Return the hex digest for one algorithm.
    pub fn get(&self, algorithm: DigestAlgorithm) -> &str {
        match algorithm {
            DigestAlgorithm::Md5 => &self.md5,
            DigestAlgorithm::Sha1 => &self.sha1,
            DigestAlgorithm::Sha256 => &self.sha256,
            DigestAlgorithm::Sha512 => &self.sha512,
        }
    }

    /// Iterate `(algorithm, hex)` pairs in digest-set order.
    pub fn iter(&self) -> impl Iterator<Item = (DigestAlgorithm, &str)> + '_ {
        DigestAlgorithm::ALL.into_iter().map(move |a| (a, self.get(a)))
    }

    /// Check that every digest is lowercase hex of the right length.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (algorithm, hex) in self.iter() {
            if hex.len() != algorithm.hex_len() {
                return Err(ValidationError::MalformedDigest {
                    algorithm,
                    reason: format!(
                        "expected {} hex chars, got {}",
                        algorithm.hex_len(),
                        hex.len()
                    ),
                });
            }
            if !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
                return Err(ValidationError::MalformedDigest {
                    algorithm,
                    reason: "contains characters outside [0-9a-f]".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Algorithms whose digests differ between `self` and `other`.
    pub fn mismatches(&self, other: &DigestSet) -> Vec<DigestAlgorithm> {
        DigestAlgorithm::ALL
            .into_iter()
            .filter(|a| self.get(*a) != other.get(*a))
            .collect()
    }

    /// True when all four digests agree.
    pub fn matches(&self, other: &DigestSet) -> bool {
        self.mismatches(other).is_empty()
    }
}

/// Render bytes as a lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
