//! # Evidence Store
//!
//! Append, latest, history and enumerate over a [`Ledger`].
//!
//! The store holds nothing but the ledger handle. Every call re-derives the
//! current version of an item from the ledger by probing keys
//! `id_1, id_2, …` until the first gap, so a crash can never leave a stale
//! counter behind. The cost is one point read per existing version.

use evl_core::{
    ledger_key, parse_ledger_key, EvidenceDraft, EvidenceId, EvidenceRecord, Version,
};

use crate::backend::Ledger;
use crate::error::StoreError;

/// Versioned evidence record store over an injected ledger.
#[derive(Debug, Clone)]
pub struct EvidenceStore<L> {
    ledger: L,
}

impl<L: Ledger> EvidenceStore<L> {
    /// Wrap a ledger.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// The underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Highest contiguous version present for `id`, or 0 if none exist.
    pub fn latest_version(&self, id: &EvidenceId) -> Result<u64, StoreError> {
        let mut latest = 0;
        self.walk(id, |version, _| {
            latest = version.get();
            Ok(())
        })?;
        Ok(latest)
    }

    /// Append a new version of `draft.evidence_id`.
    ///
    /// The version is `latest + 1`. The write is put-if-absent: if another
    /// appender took that version first, this returns a `WRITE_CONFLICT`
    /// storage error and writes nothing. The store does not retry.
    pub fn append(&self, draft: EvidenceDraft) -> Result<EvidenceRecord, StoreError> {
        let latest = self.latest_version(&draft.evidence_id)?;
        let record = draft.into_record(Version::after(latest));
        let key = record.ledger_key();
        let bytes = record.to_json_bytes()?;

        if let Err(e) = self.ledger.put_new(&key, &bytes) {
            let err = StoreError::from(e);
            if err.is_conflict() {
                tracing::warn!(
                    evidence_id = %record.evidence_id,
                    version = %record.version,
                    "append lost race for version"
                );
            } else {
                tracing::error!(
                    evidence_id = %record.evidence_id,
                    version = %record.version,
                    error = %err,
                    "append failed"
                );
            }
            return Err(err);
        }

        tracing::info!(
            evidence_id = %record.evidence_id,
            version = %record.version,
            sha256 = %record.digests.sha256,
            "evidence version appended"
        );
        Ok(record)
    }

    /// The latest version of `id`.
    pub fn get_latest(&self, id: &EvidenceId) -> Result<EvidenceRecord, StoreError> {
        let mut last = None;
        self.walk(id, |version, bytes| {
            last = Some((version, bytes));
            Ok(())
        })?;
        match last {
            Some((version, bytes)) => decode(id, version, &bytes),
            None => Err(StoreError::NotFound {
                id: id.clone(),
                version: None,
            }),
        }
    }

    /// One specific version of `id`.
    pub fn get_version(&self, id: &EvidenceId, version: Version) -> Result<EvidenceRecord, StoreError> {
        let bytes = self.get_version_raw(id, version)?;
        decode(id, version, &bytes)
    }

    /// The exact bytes committed for one version of `id`.
    pub fn get_version_raw(&self, id: &EvidenceId, version: Version) -> Result<Vec<u8>, StoreError> {
        self.ledger
            .get(&ledger_key(id, version))?
            .ok_or_else(|| StoreError::NotFound {
                id: id.clone(),
                version: Some(version),
            })
    }

    /// Every version of `id`, ascending. Empty if none exist.
    pub fn history(&self, id: &EvidenceId) -> Result<Vec<EvidenceRecord>, StoreError> {
        let mut records = Vec::new();
        self.walk(id, |version, bytes| {
            records.push(decode(id, version, &bytes)?);
            Ok(())
        })?;
        Ok(records)
    }

    /// Every version of every item, in ledger iteration order.
    ///
    /// Not grouped and not filtered to latest-only.
    pub fn all(&self) -> Result<Vec<EvidenceRecord>, StoreError> {
        self.ledger
            .scan("", "")?
            .into_iter()
            .map(|(key, bytes)| {
                let (id, version) = parse_ledger_key(&key).ok_or_else(|| StoreError::Corrupt {
                    key: key.clone(),
                    reason: "key does not follow the evidence key layout".to_string(),
                })?;
                decode(&id, version, &bytes)
            })
            .collect()
    }

    /// Probe `id_1, id_2, …` and hand each present value to `visit`,
    /// stopping at the first absent key.
    fn walk(
        &self,
        id: &EvidenceId,
        mut visit: impl FnMut(Version, Vec<u8>) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let mut version = Version::FIRST;
        while let Some(bytes) = self.ledger.get(&ledger_key(id, version))? {
            visit(version, bytes)?;
            version = version.next();
        }
        Ok(())
    }
}

/// Parse a stored value and check it belongs under the key it was read
/// from.
fn decode(id: &EvidenceId, version: Version, bytes: &[u8]) -> Result<EvidenceRecord, StoreError> {
    let key = ledger_key(id, version);
    let record = EvidenceRecord::from_json_bytes(bytes).map_err(|e| StoreError::Corrupt {
        key: key.clone(),
        reason: e.to_string(),
    })?;
    if &record.evidence_id != id || record.version != version {
        return Err(StoreError::Corrupt {
            key,
            reason: format!(
                "record claims {}_{}",
                record.evidence_id, record.version
            ),
        });
    }
    record.digests.validate().map_err(|e| StoreError::Corrupt {
        key,
        reason: e.to_string(),
    })?;
    Ok(record)
}
