//! # Multi-Algorithm Digest Computation
//!
//! One read drives four accumulators. `MultiDigest` exposes the
//! accumulator directly; `compute_digests` wraps it in a read loop over a
//! `std::io::Read`.
//!
//! ## Integrity Invariant
//!
//! A `DigestSet` is only ever produced by [`MultiDigest::finalize`], after
//! every accumulator has seen exactly the same sequence of `update` calls.
//! On a read error the accumulator is dropped, so a partial set cannot
//! escape.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use evl_core::{to_hex, DigestSet};
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::error::DigestError;

/// Size of the buffer used by [`compute_digests`] for each read.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Incremental accumulator feeding MD5, SHA-1, SHA-256 and SHA-512 in
/// lockstep.
#[derive(Clone, Default)]
pub struct MultiDigest {
    md5: Md5,
    sha1: Sha1,
    sha256: Sha256,
    sha512: Sha512,
    bytes: u64,
}

impl MultiDigest {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of content to all four hashes.
    pub fn update(&mut self, chunk: &[u8]) {
        self.md5.update(chunk);
        self.sha1.update(chunk);
        self.sha256.update(chunk);
        self.sha512.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Number of bytes consumed so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.bytes
    }

    /// Finish all four hashes and render them as lowercase hex.
    pub fn finalize(self) -> DigestSet {
        DigestSet {
            md5: to_hex(&self.md5.finalize()),
            sha1: to_hex(&self.sha1.finalize()),
            sha256: to_hex(&self.sha256.finalize()),
            sha512: to_hex(&self.sha512.finalize()),
        }
    }
}

impl std::fmt::Debug for MultiDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiDigest")
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

/// Drain `reader` in a single forward pass and return its digest set.
///
/// `Interrupted` reads are retried; any other read error aborts and no
/// digests are returned.
pub fn compute_digests<R: Read>(mut reader: R) -> Result<DigestSet, DigestError> {
    let mut acc = MultiDigest::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(source) => {
                tracing::warn!(
                    bytes_read = acc.bytes_consumed(),
                    error = %source,
                    "digest computation aborted"
                );
                return Err(DigestError::IoFailure {
                    bytes_read: acc.bytes_consumed(),
                    source,
                });
            }
        };
        acc.update(&buf[..n]);
    }
    tracing::debug!(bytes = acc.bytes_consumed(), "digest computation complete");
    Ok(acc.finalize())
}

/// Open a file and compute its digest set.
pub fn compute_file_digests(path: &Path) -> Result<DigestSet, DigestError> {
    let file = File::open(path).map_err(|source| DigestError::IoFailure {
        bytes_read: 0,
        source,
    })?;
    compute_digests(file)
}
