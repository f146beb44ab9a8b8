//! # evl CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use evl_api::logging::{init_tracing, LogFormat};
use evl_cli::evidence::{
    run_append, run_history, run_list, run_show, run_verify, AppendArgs, HistoryArgs, ListArgs,
    ShowArgs, VerifyArgs,
};
use evl_cli::hash::{run_hash, HashArgs};
use evl_cli::serve::{run_serve, ServeArgs};

/// Evidence ledger CLI
///
/// Digest evidence files, record them as immutable versions on a local
/// ledger, query and verify them, or run the HTTP gateway.
#[derive(Parser, Debug)]
#[command(name = "evl", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the MD5, SHA-1, SHA-256 and SHA-512 digests of a file.
    Hash(HashArgs),

    /// Append a file as the next version of an evidence item.
    Append(AppendArgs),

    /// Show the latest (or a specific) version of an evidence item.
    Show(ShowArgs),

    /// Show every version of an evidence item.
    History(HistoryArgs),

    /// Show every version of every evidence item.
    List(ListArgs),

    /// Check a file against the digests recorded for an evidence version.
    Verify(VerifyArgs),

    /// Run the HTTP gateway.
    Serve(ServeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // `serve` logs at info unless asked to be quieter or louder.
    let directive = match (&cli.command, cli.verbose) {
        (Commands::Serve(_), 0) => "info",
        _ => directive,
    };
    let format = std::env::var("EVL_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LogFormat::Text);
    init_tracing(format, directive);

    let mut stdout = std::io::stdout().lock();
    let result = match &cli.command {
        Commands::Hash(args) => run_hash(args, &mut stdout),
        Commands::Append(args) => run_append(args, &mut stdout),
        Commands::Show(args) => run_show(args, &mut stdout),
        Commands::History(args) => run_history(args, &mut stdout),
        Commands::List(args) => run_list(args, &mut stdout),
        Commands::Verify(args) => run_verify(args, &mut stdout),
        Commands::Serve(args) => run_serve(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
