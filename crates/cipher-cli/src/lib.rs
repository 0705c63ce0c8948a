//! # cipher-cli — Command-Line Front End
//!
//! Provides the `cipher` binary. Each subcommand is a thin shell over
//! `cipher-tree`: it reads files, calls one library operation and prints
//! the result.
//!
//! ## Subcommands
//!
//! - `cipher build` — Snapshot to persisted tree.
//! - `cipher root` — Recompute the root from a persisted tree.
//! - `cipher prove` — Extract prover inputs for one snapshot row.
//! - `cipher verify` — Check a saved Merkle proof against a root.
//! - `cipher assign` — Emit the discovered index assignment.
//!
//! ```bash
//! cipher build --snapshot courses_assigned.csv --out full_tree.json
//! cipher root --tree full_tree.json
//! cipher prove --tree full_tree.json --snapshot courses_assigned.csv --row 0 --out Prover.toml
//! ```
//!
//! ## Exit Codes
//!
//! `0` success, `1` fatal error, `2` consistency failure (stale tree,
//! root mismatch, index collision).

pub mod assign;
pub mod build;
pub mod prove;
pub mod root;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use cipher_core::{CipherError, Config, ConsistencyError, FieldElement};

/// Successful run.
pub const EXIT_OK: u8 = 0;
/// Unrecoverable error.
pub const EXIT_FATAL: u8 = 1;
/// A consistency check failed.
pub const EXIT_MISMATCH: u8 = 2;

/// Load the configuration file, or the built-in defaults when none is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load(p).with_context(|| format!("failed to load config: {}", p.display())),
        None => Ok(Config::default()),
    }
}

/// Map a failed run to its process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if cause.downcast_ref::<ConsistencyError>().is_some()
            || matches!(cause.downcast_ref::<CipherError>(), Some(CipherError::Consistency(_)))
        {
            return EXIT_MISMATCH;
        }
    }
    EXIT_FATAL
}

/// Parse a root given on the command line.
pub fn parse_root(text: &str) -> Result<FieldElement> {
    FieldElement::parse(text).with_context(|| format!("invalid root: {text}"))
}

/// Write `text` to `path`, or stdout when no path is given.
pub fn emit(text: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => std::fs::write(p, text).with_context(|| format!("failed to write {}", p.display())),
        None => {
            println!("{text}");
            Ok(())
        }
    }
}
