//! # cipher CLI entry point
//!
//! Parses command-line arguments, installs logging and dispatches to the
//! subcommand handlers in the library crate.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cipher_cli::assign::{run_assign, AssignArgs};
use cipher_cli::build::{run_build, BuildArgs};
use cipher_cli::prove::{run_prove, ProveArgs};
use cipher_cli::root::{run_root, RootArgs};
use cipher_cli::verify::{run_verify, VerifyArgs};
use cipher_cli::{exit_code_for, load_config};

/// Enrollment commitment tree tooling.
///
/// Builds the sparse Merkle tree over a finalized enrollment snapshot,
/// recomputes its root and extracts membership proofs for the external
/// proof generator.
#[derive(Parser, Debug)]
#[command(name = "cipher", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (YAML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the tree from a snapshot and write it to disk.
    Build(BuildArgs),

    /// Recompute the root of a persisted tree.
    Root(RootArgs),

    /// Extract prover inputs for one snapshot row.
    Prove(ProveArgs),

    /// Check a saved Merkle proof against a root.
    Verify(VerifyArgs),

    /// Emit the index assignment discovered from a snapshot.
    Assign(AssignArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "cipher starting");

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Build(args) => run_build(args, &config),
        Commands::Root(args) => run_root(args),
        Commands::Prove(args) => run_prove(args, &config),
        Commands::Verify(args) => run_verify(args, &config),
        Commands::Assign(args) => run_assign(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}
