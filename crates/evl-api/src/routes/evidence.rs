//! # Evidence Routes
//!
//! - `POST /saveEvidence`                          — Upload content, append a new version
//! - `GET  /queryEvidence/{evidenceID}`            — Latest version
//! - `GET  /queryEvidence/{evidenceID}/{version}`  — One specific version
//! - `GET  /queryEvidenceHistory/{evidenceID}`     — Every version, ascending
//! - `GET  /queryAllEvidence`                      — Every version of every item
//! - `POST /verifyEvidence/{evidenceID}`           — Re-digest content, compare to a stored version
//!
//! Uploads are `multipart/form-data`. The `file` part is streamed chunk by
//! chunk into a [`MultiDigest`] and never buffered whole. Ledger calls are
//! synchronous and run on tokio's blocking pool.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use evl_core::{DigestAlgorithm, DigestSet, EvidenceDraft, EvidenceId, EvidenceRecord, Version};
use evl_crypto::MultiDigest;
use evl_ledger::{EvidenceStore, StoreError};

use crate::error::AppError;
use crate::state::{AppState, SharedLedger};

/// Multipart part carrying the evidence content.
const FILE_FIELD: &str = "file";

/// Assemble the evidence router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/saveEvidence", post(save_evidence))
        .route("/queryEvidence/{evidence_id}", get(query_evidence))
        .route(
            "/queryEvidence/{evidence_id}/{version}",
            get(query_evidence_version),
        )
        .route("/queryEvidenceHistory/{evidence_id}", get(query_evidence_history))
        .route("/queryAllEvidence", get(query_all_evidence))
        .route("/verifyEvidence/{evidence_id}", post(verify_evidence))
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Success envelope shared by every evidence route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Always `"200"` on success.
    pub code: String,
    pub message: String,
    pub result: T,
}

impl<T> ApiResponse<T> {
    fn ok(message: &str, result: T) -> Json<Self> {
        Json(Self {
            code: "200".to_string(),
            message: message.to_string(),
            result,
        })
    }
}

/// Response to `POST /saveEvidence`: the envelope plus the assigned
/// version and digests at top level.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveEvidenceResponse {
    pub code: String,
    pub message: String,
    pub result: EvidenceRecord,
    pub version: Version,
    pub md5: String,
    pub sha1: String,
    pub sha256: String,
    pub sha512: String,
}

/// Outcome of re-digesting content against a stored version.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResult {
    /// True when all four digests agree.
    pub matches: bool,
    /// The version compared against.
    pub version: Version,
    /// Digests recorded on the ledger.
    pub expected: DigestSet,
    /// Digests of the uploaded content.
    pub actual: DigestSet,
    /// Algorithms whose digests differ.
    pub mismatches: Vec<DigestAlgorithm>,
}

// ---------------------------------------------------------------------------
// Upload parsing
// ---------------------------------------------------------------------------

/// Text fields and content digests pulled from one multipart upload.
struct Upload {
    fields: HashMap<String, String>,
    digests: Option<DigestSet>,
    bytes: u64,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = HashMap::new();
        let mut content: Option<MultiDigest> = None;

        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == FILE_FIELD {
                if content.is_some() {
                    return Err(AppError::Validation(
                        "upload carries more than one file part".to_string(),
                    ));
                }
                let mut digest = MultiDigest::new();
                while let Some(chunk) = field.chunk().await? {
                    digest.update(&chunk);
                }
                content = Some(digest);
            } else {
                let value = field.text().await?;
                fields.insert(name, value);
            }
        }

        let bytes = content.as_ref().map_or(0, MultiDigest::bytes_consumed);
        Ok(Self {
            fields,
            digests: content.map(MultiDigest::finalize),
            bytes,
        })
    }

    /// Take an optional text field.
    fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Take a required text field.
    fn require(&mut self, name: &str) -> Result<String, AppError> {
        self.take(name)
            .ok_or_else(|| AppError::Validation(format!("missing form field {name:?}")))
    }

    /// Take the content digests; the file part is mandatory.
    fn digests(&mut self) -> Result<DigestSet, AppError> {
        self.digests
            .take()
            .ok_or_else(|| AppError::Validation(format!("missing form field {FILE_FIELD:?}")))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run a store operation on the blocking pool.
async fn blocking<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    F: FnOnce(&EvidenceStore<SharedLedger>) -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    Ok(tokio::task::spawn_blocking(move || op(&store)).await??)
}

fn parse_version(raw: &str) -> Result<Version, AppError> {
    let n: u64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("version {raw:?} is not a positive integer")))?;
    Ok(Version::new(n)?)
}

/// Append, re-probing the latest version after each lost race.
async fn append_with_retry(
    state: &AppState,
    draft: EvidenceDraft,
) -> Result<EvidenceRecord, AppError> {
    let retries = state.config.append_retries;
    let mut attempt = 0;
    loop {
        let d = draft.clone();
        match tokio::task::spawn_blocking({
            let store = state.store.clone();
            move || store.append(d)
        })
        .await?
        {
            Ok(record) => return Ok(record),
            Err(e) if e.is_conflict() && attempt < retries => {
                attempt += 1;
                tracing::debug!(
                    evidence_id = %draft.evidence_id,
                    attempt,
                    "retrying append after write conflict"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /saveEvidence — Digest the uploaded file and append a new version.
async fn save_evidence(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SaveEvidenceResponse>, AppError> {
    let mut upload = Upload::read(multipart).await?;
    let evidence_id = EvidenceId::new(upload.require("evidenceID")?)?;
    let digests = upload.digests()?;
    let draft = EvidenceDraft {
        evidence_id,
        timestamp: upload.take("timestamp").unwrap_or_default(),
        collector: upload.take("collector").unwrap_or_default(),
        description: upload.take("description").unwrap_or_default(),
        digests,
    };

    let record = append_with_retry(&state, draft).await?;
    tracing::info!(
        evidence_id = %record.evidence_id,
        version = %record.version,
        bytes = upload.bytes,
        "evidence saved"
    );

    Ok(Json(SaveEvidenceResponse {
        code: "200".to_string(),
        message: "Evidence saved successfully!".to_string(),
        version: record.version,
        md5: record.digests.md5.clone(),
        sha1: record.digests.sha1.clone(),
        sha256: record.digests.sha256.clone(),
        sha512: record.digests.sha512.clone(),
        result: record,
    }))
}

/// GET /queryEvidence/{evidenceID} — Latest version.
async fn query_evidence(
    State(state): State<AppState>,
    Path(evidence_id): Path<String>,
) -> Result<Json<ApiResponse<EvidenceRecord>>, AppError> {
    let id = EvidenceId::new(evidence_id)?;
    let record = blocking(&state, move |store| store.get_latest(&id)).await?;
    Ok(ApiResponse::ok("Evidence retrieved successfully", record))
}

/// GET /queryEvidence/{evidenceID}/{version} — One specific version.
async fn query_evidence_version(
    State(state): State<AppState>,
    Path((evidence_id, version)): Path<(String, String)>,
) -> Result<Json<ApiResponse<EvidenceRecord>>, AppError> {
    let id = EvidenceId::new(evidence_id)?;
    let version = parse_version(&version)?;
    let record = blocking(&state, move |store| store.get_version(&id, version)).await?;
    Ok(ApiResponse::ok("Evidence retrieved successfully", record))
}

/// GET /queryEvidenceHistory/{evidenceID} — Every version, ascending.
///
/// An id that was never appended yields an empty list, not 404.
async fn query_evidence_history(
    State(state): State<AppState>,
    Path(evidence_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<EvidenceRecord>>>, AppError> {
    let id = EvidenceId::new(evidence_id)?;
    let history = blocking(&state, move |store| store.history(&id)).await?;
    Ok(ApiResponse::ok("Evidence history retrieved successfully", history))
}

/// GET /queryAllEvidence — Every version of every item, in ledger order.
async fn query_all_evidence(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<EvidenceRecord>>>, AppError> {
    let all = blocking(&state, |store| store.all()).await?;
    Ok(ApiResponse::ok("All evidence retrieved successfully", all))
}

/// POST /verifyEvidence/{evidenceID} — Compare uploaded content against
/// the latest version, or the one named by the `version` field.
async fn verify_evidence(
    State(state): State<AppState>,
    Path(evidence_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<ApiResponse<VerifyResult>>, AppError> {
    let id = EvidenceId::new(evidence_id)?;
    let mut upload = Upload::read(multipart).await?;
    let actual = upload.digests()?;
    let version = upload
        .take("version")
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_version(&v))
        .transpose()?;

    let record = blocking(&state, move |store| match version {
        Some(v) => store.get_version(&id, v),
        None => store.get_latest(&id),
    })
    .await?;

    let mismatches = record.digests.mismatches(&actual);
    if mismatches.is_empty() {
        tracing::info!(evidence_id = %record.evidence_id, version = %record.version, "evidence verified");
    } else {
        tracing::warn!(
            evidence_id = %record.evidence_id,
            version = %record.version,
            ?mismatches,
            "evidence content does not match ledger"
        );
    }

    Ok(ApiResponse::ok(
        "Evidence verification complete",
        VerifyResult {
            matches: mismatches.is_empty(),
            version: record.version,
            expected: record.digests,
            actual,
            mismatches,
        },
    ))
}
