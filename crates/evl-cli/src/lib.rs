//! # evl-cli — CLI Tool for the Evidence Ledger
//!
//! Provides the `evl` command-line interface over a local filesystem
//! ledger, plus a `serve` subcommand that runs the HTTP gateway.
//!
//! ## Subcommands
//!
//! - `evl hash` — Digest a file with all four algorithms.
//! - `evl append` — Record a file as the next version of an evidence item.
//! - `evl show` — Show the latest or a specific version.
//! - `evl history` — Show every version of an item.
//! - `evl list` — Show every version of every item.
//! - `evl verify` — Re-digest a file and compare it to a stored version.
//! - `evl serve` — Run the HTTP gateway.
//!
//! ```bash
//! evl append --ledger-dir ./ledger --id case-7/disk.img --collector alice disk.img
//! evl verify --ledger-dir ./ledger --id case-7/disk.img disk.img
//! ```
//!
//! All command output is pretty-printed JSON on stdout. Logs go to stderr.

pub mod evidence;
pub mod hash;
pub mod serve;

use std::io::Write;

use anyhow::Result;
use serde::Serialize;

/// Exit code for a successful command.
pub const EXIT_OK: u8 = 0;

/// Exit code when `verify` finds the content does not match.
pub const EXIT_MISMATCH: u8 = 2;

/// Write `value` as pretty JSON followed by a newline.
pub fn print_json<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
