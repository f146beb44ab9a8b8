//! # Evidence Records
//!
//! `EvidenceDraft` is what a client submits: identifier, opaque metadata and
//! the digest set of the uploaded content. `EvidenceRecord` is one committed,
//! immutable version of it, stamped with the version number the store
//! assigned.
//!
//! `timestamp`, `collector` and `description` are stored verbatim and never
//! interpreted.

use serde::{Deserialize, Serialize};

use crate::digest::DigestSet;
use crate::identity::{EvidenceId, Version};
use crate::key::ledger_key;

/// Evidence metadata awaiting a version number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceDraft {
    pub evidence_id: EvidenceId,
    pub timestamp: String,
    pub collector: String,
    pub description: String,
    pub digests: DigestSet,
}

impl EvidenceDraft {
    /// Stamp the draft with its assigned version.
    pub fn into_record(self, version: Version) -> EvidenceRecord {
        EvidenceRecord {
            evidence_id: self.evidence_id,
            version,
            timestamp: self.timestamp,
            collector: self.collector,
            digests: self.digests,
            description: self.description,
        }
    }
}

/// One immutable version of an evidence item.
///
/// Field order here is the serialized field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    /// Logical evidence item this version belongs to.
    #[serde(rename = "evidenceID")]
    pub evidence_id: EvidenceId,
    /// Store-assigned version, contiguous from 1.
    pub version: Version,
    /// Collection time as supplied by the client.
    pub timestamp: String,
    /// Who collected the evidence.
    pub collector: String,
    /// Digests of the submitted content.
    #[serde(flatten)]
    pub digests: DigestSet,
    /// Free-text description.
    pub description: String,
}

impl EvidenceRecord {
    /// The ledger key this record is stored under.
    pub fn ledger_key(&self) -> String {
        ledger_key(&self.evidence_id, self.version)
    }

    /// Serialize to the stored JSON form.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Parse the stored JSON form.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digests() -> DigestSet {
        DigestSet {
            md5: "a".repeat(32),
            sha1: "b".repeat(40),
            sha256: "c".repeat(64),
            sha512: "d".repeat(128),
        }
    }

    fn draft() -> EvidenceDraft {
        EvidenceDraft {
            evidence_id: EvidenceId::new("E1").unwrap(),
            timestamp: "2024-05-01T10:00:00Z".to_string(),
            collector: "alice".to_string(),
            description: "disk image".to_string(),
            digests: digests(),
        }
    }

    #[test]
    fn test_into_record_assigns_version() {
        let record = draft().into_record(Version::new(3).unwrap());
        assert_eq!(record.version.get(), 3);
        assert_eq!(record.ledger_key(), "E1_3");
        assert_eq!(record.collector, "alice");
    }

    #[test]
    fn test_serialized_layout() {
        let record = draft().into_record(Version::FIRST);
        let bytes = record.to_json_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with(r#"{"evidenceID":"E1","version":1,"timestamp":"#));
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["md5Hash"], "a".repeat(32));
        assert_eq!(v["sha512Hash"], "d".repeat(128));
        assert_eq!(v["description"], "disk image");
        assert!(v.get("digests").is_none());
    }

    #[test]
    fn test_parses_original_layout() {
        let json = serde_json::json!({
            "evidenceID": "E9",
            "version": 2,
            "timestamp": "t",
            "collector": "c",
            "md5Hash": "a".repeat(32),
            "sha1Hash": "b".repeat(40),
            "sha256Hash": "c".repeat(64),
            "sha512Hash": "d".repeat(128),
            "description": "d"
        });
        let record = EvidenceRecord::from_json_bytes(json.to_string().as_bytes()).unwrap();
        assert_eq!(record.evidence_id.as_str(), "E9");
        assert_eq!(record.version.get(), 2);
        assert_eq!(record.digests, digests());
    }

    #[test]
    fn test_rejects_zero_version() {
        let json = serde_json::json!({
            "evidenceID": "E9",
            "version": 0,
            "timestamp": "t",
            "collector": "c",
            "md5Hash": "", "sha1Hash": "", "sha256Hash": "", "sha512Hash": "",
            "description": "d"
        });
        assert!(EvidenceRecord::from_json_bytes(json.to_string().as_bytes()).is_err());
    }
}
