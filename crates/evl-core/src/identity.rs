//! # Evidence Identity Newtypes
//!
//! `EvidenceId` names a logical evidence item; `Version` numbers one
//! immutable snapshot of it. Both validate on construction and on
//! deserialization, so a value of either type is always well-formed.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum length of an evidence identifier, in bytes.
pub const MAX_EVIDENCE_ID_LEN: usize = 256;

/// Client-supplied identifier grouping all versions of one evidence item.
///
/// The identifier is otherwise opaque: underscores, slashes and non-ASCII
/// text are all accepted. Only empty strings, strings longer than
/// [`MAX_EVIDENCE_ID_LEN`] bytes and strings with ASCII control characters
/// are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvidenceId(String);

impl EvidenceId {
    /// Create a validated evidence identifier.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyEvidenceId);
        }
        if id.len() > MAX_EVIDENCE_ID_LEN {
            return Err(ValidationError::EvidenceIdTooLong {
                len: id.len(),
                max: MAX_EVIDENCE_ID_LEN,
            });
        }
        if let Some(position) = id.bytes().position(|b| b.is_ascii_control()) {
            return Err(ValidationError::EvidenceIdControlChar { position });
        }
        Ok(Self(id))
    }

    /// Access the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EvidenceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EvidenceId> for String {
    fn from(id: EvidenceId) -> Self {
        id.0
    }
}

impl std::fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version number of one evidence snapshot. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct Version(u64);

impl Version {
    /// The first version of every evidence item.
    pub const FIRST: Version = Version(1);

    /// Create a version number, rejecting zero.
    pub fn new(n: u64) -> Result<Self, ValidationError> {
        if n == 0 {
            return Err(ValidationError::ZeroVersion);
        }
        Ok(Self(n))
    }

    /// The version that follows this one.
    pub fn next(self) -> Version {
        Version(self.0.saturating_add(1))
    }

    /// The version after `latest`, where `latest == 0` means none exist yet.
    pub fn after(latest: u64) -> Version {
        Version(latest.saturating_add(1))
    }

    /// The raw version number.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for Version {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Version> for u64 {
    fn from(v: Version) -> Self {
        v.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evidence_id_accepts_opaque_text() {
        for raw in ["E1", "case_42_disk", "a/b/c", "证据-7"] {
            assert_eq!(EvidenceId::new(raw).unwrap().as_str(), raw);
        }
    }

    #[test]
    fn test_evidence_id_rejects_empty() {
        assert_eq!(EvidenceId::new(""), Err(ValidationError::EmptyEvidenceId));
    }

    #[test]
    fn test_evidence_id_rejects_too_long() {
        let raw = "x".repeat(MAX_EVIDENCE_ID_LEN + 1);
        assert!(matches!(
            EvidenceId::new(raw),
            Err(ValidationError::EvidenceIdTooLong { len: 257, max: 256 })
        ));
        assert!(EvidenceId::new("x".repeat(MAX_EVIDENCE_ID_LEN)).is_ok());
    }

    #[test]
    fn test_evidence_id_rejects_control_chars() {
        assert_eq!(
            EvidenceId::new("ab\ncd"),
            Err(ValidationError::EvidenceIdControlChar { position: 2 })
        );
    }

    #[test]
    fn test_evidence_id_deserialize_validates() {
        let ok: EvidenceId = serde_json::from_str("\"E1\"").unwrap();
        assert_eq!(ok.as_str(), "E1");
        assert!(serde_json::from_str::<EvidenceId>("\"\"").is_err());
    }

    #[test]
    fn test_version_rejects_zero() {
        assert_eq!(Version::new(0), Err(ValidationError::ZeroVersion));
        assert!(serde_json::from_str::<Version>("0").is_err());
    }

    #[test]
    fn test_version_sequence() {
        assert_eq!(Version::after(0), Version::FIRST);
        assert_eq!(Version::FIRST.next().get(), 2);
        assert_eq!(Version::after(41).get(), 42);
    }

    #[test]
    fn test_version_serializes_as_number() {
        let v = Version::new(7).unwrap();
        assert_eq!(serde_json::to_string(&v).unwrap(), "7");
    }
}
