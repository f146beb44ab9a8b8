//! # Hash Subcommand
//!
//! Digest a file without touching any ledger.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use evl_core::DigestSet;
use evl_crypto::compute_file_digests;

use crate::{print_json, EXIT_OK};

/// Arguments for `evl hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// File to digest.
    pub file: PathBuf,
}

#[derive(Serialize)]
struct HashOutput<'a> {
    file: &'a str,
    #[serde(flatten)]
    digests: DigestSet,
}

/// Print the digest set of `args.file`.
pub fn run_hash(args: &HashArgs, out: &mut dyn Write) -> Result<u8> {
    let digests = compute_file_digests(&args.file)
        .with_context(|| format!("failed to digest {}", args.file.display()))?;
    let file = args.file.to_string_lossy();
    print_json(out, &HashOutput { file: &file, digests })?;
    Ok(EXIT_OK)
}
