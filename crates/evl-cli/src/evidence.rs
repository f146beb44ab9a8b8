//! # Evidence Subcommands
//!
//! Append, query and verify evidence versions on a local filesystem
//! ledger. The ledger directory is shared safely with a running gateway:
//! both sides append through put-if-absent, so a lost race is detected and
//! retried rather than overwriting.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use evl_core::{DigestAlgorithm, DigestSet, EvidenceDraft, EvidenceId, EvidenceRecord, Version};
use evl_crypto::compute_file_digests;
use evl_ledger::{EvidenceStore, FileLedger};

use crate::{print_json, EXIT_MISMATCH, EXIT_OK};

/// Attempts before `append` gives up on repeated write conflicts.
const APPEND_ATTEMPTS: u32 = 4;

/// Ledger location shared by every evidence subcommand.
#[derive(Args, Debug, Clone)]
pub struct LedgerArgs {
    /// Root directory of the filesystem ledger.
    #[arg(long)]
    pub ledger_dir: PathBuf,
}

impl LedgerArgs {
    fn open(&self) -> Result<EvidenceStore<FileLedger>> {
        let ledger = FileLedger::open(&self.ledger_dir)
            .with_context(|| format!("failed to open ledger at {}", self.ledger_dir.display()))?;
        Ok(EvidenceStore::new(ledger))
    }
}

/// Arguments for `evl append`.
#[derive(Args, Debug)]
pub struct AppendArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,
    /// Evidence identifier.
    #[arg(long)]
    pub id: String,
    /// Who collected the evidence.
    #[arg(long)]
    pub collector: String,
    /// Free-text description.
    #[arg(long, default_value = "")]
    pub description: String,
    /// Collection time. Defaults to now, RFC 3339 UTC.
    #[arg(long)]
    pub timestamp: Option<String>,
    /// File holding the evidence content.
    pub file: PathBuf,
}

/// Arguments for `evl show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,
    /// Evidence identifier.
    #[arg(long)]
    pub id: String,
    /// Specific version. Defaults to the latest.
    #[arg(long)]
    pub version: Option<u64>,
}

/// Arguments for `evl history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,
    /// Evidence identifier.
    #[arg(long)]
    pub id: String,
}

/// Arguments for `evl list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,
}

/// Arguments for `evl verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub ledger: LedgerArgs,
    /// Evidence identifier.
    #[arg(long)]
    pub id: String,
    /// Version to compare against. Defaults to the latest.
    #[arg(long)]
    pub version: Option<u64>,
    /// File whose content should match the stored digests.
    pub file: PathBuf,
}

/// Report printed by `evl verify`.
#[derive(Debug, Serialize)]
pub struct VerifyReport {
    #[serde(rename = "evidenceID")]
    pub evidence_id: EvidenceId,
    pub version: Version,
    pub matches: bool,
    pub expected: DigestSet,
    pub actual: DigestSet,
    pub mismatches: Vec<DigestAlgorithm>,
}

fn digest_file(path: &Path) -> Result<DigestSet> {
    compute_file_digests(path).with_context(|| format!("failed to digest {}", path.display()))
}

fn lookup(
    store: &EvidenceStore<FileLedger>,
    id: &EvidenceId,
    version: Option<u64>,
) -> Result<EvidenceRecord> {
    let record = match version {
        Some(n) => store.get_version(id, Version::new(n)?)?,
        None => store.get_latest(id)?,
    };
    Ok(record)
}

/// Digest `args.file` and append it as the next version of `args.id`.
pub fn run_append(args: &AppendArgs, out: &mut dyn Write) -> Result<u8> {
    let id = EvidenceId::new(args.id.as_str())?;
    let digests = digest_file(&args.file)?;
    let timestamp = args
        .timestamp
        .clone()
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true));
    let draft = EvidenceDraft {
        evidence_id: id,
        timestamp,
        collector: args.collector.clone(),
        description: args.description.clone(),
        digests,
    };

    let store = args.ledger.open()?;
    let mut attempt = 1;
    let record = loop {
        match store.append(draft.clone()) {
            Ok(record) => break record,
            Err(e) if e.is_conflict() && attempt < APPEND_ATTEMPTS => {
                tracing::info!(attempt, "write conflict, retrying append");
                attempt += 1;
            }
            Err(e) => return Err(e).context("append failed"),
        }
    };

    print_json(out, &record)?;
    Ok(EXIT_OK)
}

/// Print the latest version of `args.id`, or the one `args.version` names.
pub fn run_show(args: &ShowArgs, out: &mut dyn Write) -> Result<u8> {
    let id = EvidenceId::new(args.id.as_str())?;
    let store = args.ledger.open()?;
    let record = lookup(&store, &id, args.version)?;
    print_json(out, &record)?;
    Ok(EXIT_OK)
}

/// Print every version of `args.id`, ascending.
pub fn run_history(args: &HistoryArgs, out: &mut dyn Write) -> Result<u8> {
    let id = EvidenceId::new(args.id.as_str())?;
    let history = args.ledger.open()?.history(&id)?;
    print_json(out, &history)?;
    Ok(EXIT_OK)
}

/// Print every version of every evidence item.
pub fn run_list(args: &ListArgs, out: &mut dyn Write) -> Result<u8> {
    let all = args.ledger.open()?.all()?;
    print_json(out, &all)?;
    Ok(EXIT_OK)
}

/// Compare `args.file` against a stored version.
///
/// Exits [`EXIT_MISMATCH`] when any digest differs.
pub fn run_verify(args: &VerifyArgs, out: &mut dyn Write) -> Result<u8> {
    let id = EvidenceId::new(args.id.as_str())?;
    let actual = digest_file(&args.file)?;
    let store = args.ledger.open()?;
    let record = lookup(&store, &id, args.version)?;

    let mismatches = record.digests.mismatches(&actual);
    let report = VerifyReport {
        evidence_id: record.evidence_id,
        version: record.version,
        matches: mismatches.is_empty(),
        expected: record.digests,
        actual,
        mismatches,
    };
    print_json(out, &report)?;

    if report.matches {
        Ok(EXIT_OK)
    } else {
        tracing::warn!(
            evidence_id = %report.evidence_id,
            version = %report.version,
            "content does not match the ledger"
        );
        Ok(EXIT_MISMATCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_args(dir: &Path) -> LedgerArgs {
        LedgerArgs {
            ledger_dir: dir.join("ledger"),
        }
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn append(dir: &Path, id: &str, file: PathBuf) -> serde_json::Value {
        let mut out = Vec::new();
        run_append(
            &AppendArgs {
                ledger: ledger_args(dir),
                id: id.to_string(),
                collector: "alice".to_string(),
                description: "imaged on site".to_string(),
                timestamp: Some("2024-05-01T10:00:00Z".to_string()),
                file,
            },
            &mut out,
        )
        .unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn append_assigns_versions_and_records_digests() {
        let dir = tempfile::tempdir().unwrap();
        let hello = write_file(dir.path(), "hello.txt", b"hello");

        let first = append(dir.path(), "E1", hello.clone());
        assert_eq!(first["version"], 1);
        assert_eq!(first["md5Hash"], "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(first["timestamp"], "2024-05-01T10:00:00Z");

        let second = append(dir.path(), "E1", hello);
        assert_eq!(second["version"], 2);
    }

    #[test]
    fn append_defaults_timestamp_to_now() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_file(dir.path(), "a.bin", b"a");
        let mut out = Vec::new();
        run_append(
            &AppendArgs {
                ledger: ledger_args(dir.path()),
                id: "E1".to_string(),
                collector: "bob".to_string(),
                description: String::new(),
                timestamp: None,
                file,
            },
            &mut out,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let ts = value["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "{ts}");
    }

    #[test]
    fn show_history_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.bin", b"a");
        append(dir.path(), "E1", a.clone());
        append(dir.path(), "E1", a.clone());
        append(dir.path(), "E2", a);

        let mut out = Vec::new();
        run_show(
            &ShowArgs {
                ledger: ledger_args(dir.path()),
                id: "E1".to_string(),
                version: Some(1),
            },
            &mut out,
        )
        .unwrap();
        let shown: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(shown["version"], 1);

        let mut out = Vec::new();
        run_history(
            &HistoryArgs {
                ledger: ledger_args(dir.path()),
                id: "E1".to_string(),
            },
            &mut out,
        )
        .unwrap();
        let history: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(history.len(), 2);

        let mut out = Vec::new();
        run_list(
            &ListArgs {
                ledger: ledger_args(dir.path()),
            },
            &mut out,
        )
        .unwrap();
        let all: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn show_unknown_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut out = Vec::new();
        let err = run_show(
            &ShowArgs {
                ledger: ledger_args(dir.path()),
                id: "ghost".to_string(),
                version: None,
            },
            &mut out,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn verify_reports_match_and_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let original = write_file(dir.path(), "orig.bin", b"hello");
        let tampered = write_file(dir.path(), "tampered.bin", b"hellO");
        append(dir.path(), "E1", original.clone());

        let verify = |file: PathBuf| {
            let mut out = Vec::new();
            let code = run_verify(
                &VerifyArgs {
                    ledger: ledger_args(dir.path()),
                    id: "E1".to_string(),
                    version: None,
                    file,
                },
                &mut out,
            )
            .unwrap();
            let report: serde_json::Value = serde_json::from_slice(&out).unwrap();
            (code, report)
        };

        let (code, report) = verify(original);
        assert_eq!(code, EXIT_OK);
        assert_eq!(report["matches"], true);

        let (code, report) = verify(tampered);
        assert_eq!(code, EXIT_MISMATCH);
        assert_eq!(report["matches"], false);
        assert_eq!(report["mismatches"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn version_zero_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_file(dir.path(), "a.bin", b"a");
        append(dir.path(), "E1", a);
        let mut out = Vec::new();
        let err = run_show(
            &ShowArgs {
                ledger: ledger_args(dir.path()),
                id: "E1".to_string(),
                version: Some(0),
            },
            &mut out,
        )
        .unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }
}
