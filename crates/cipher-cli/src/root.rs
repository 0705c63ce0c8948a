//! # Root — Recompute From a Persisted Tree
//!
//! Reloads a dump, re-derives the zero table and prints the root. With
//! `--recompute` the stored leaves are rehashed from scratch and compared
//! against the stored root.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cipher_tree::PersistedTree;

use crate::{parse_root, EXIT_MISMATCH, EXIT_OK};

/// Arguments for `cipher root`.
#[derive(Args, Debug)]
pub struct RootArgs {
    /// Persisted tree to read.
    #[arg(long, default_value = "full_tree.json")]
    pub tree: PathBuf,

    /// Compare against this published root.
    #[arg(long)]
    pub expected_root: Option<String>,

    /// Rehash every stored leaf and compare with the stored root.
    #[arg(long)]
    pub recompute: bool,
}

/// Execute `cipher root`.
pub fn run_root(args: &RootArgs) -> Result<u8> {
    let dump = PersistedTree::load(&args.tree)
        .with_context(|| format!("failed to read tree: {}", args.tree.display()))?;
    let tree = dump.restore().context("failed to restore tree")?;
    let root = tree.root();
    println!("Recomputed Merkle root: {root}");

    let mut code = EXIT_OK;
    if args.recompute {
        let check = dump.recompute().context("failed to rehash stored leaves")?;
        println!("  rehashed_root: {}", check.computed);
        println!("  consistent:    {}", check.is_valid());
        if !check.is_valid() {
            tracing::error!(stored = %check.expected, rehashed = %check.computed, "stored nodes do not match stored leaves");
            code = EXIT_MISMATCH;
        }
    }
    if let Some(text) = &args.expected_root {
        let expected = parse_root(text)?;
        println!("  expected_root: {expected}");
        println!("  valid:         {}", root == expected);
        if root != expected {
            code = EXIT_MISMATCH;
        }
    }
    Ok(code)
}
