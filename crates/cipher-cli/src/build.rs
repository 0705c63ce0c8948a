//! # Build — Snapshot to Persisted Tree
//!
//! `cipher build --snapshot courses_assigned.csv [--out full_tree.json]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cipher_core::Config;
use cipher_crypto::HashBackend;
use cipher_tree::{load_snapshot, IndexAssignment, PersistedTree, TreeBuilder};

use crate::EXIT_OK;

/// Arguments for `cipher build`.
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Finalized enrollment snapshot (CSV).
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Where to write the persisted tree.
    #[arg(long, default_value = "full_tree.json")]
    pub out: PathBuf,

    /// Also write the discovered index assignment here.
    #[arg(long)]
    pub assignment_out: Option<PathBuf>,
}

/// Execute `cipher build`.
pub fn run_build(args: &BuildArgs, config: &Config) -> Result<u8> {
    let records = load_snapshot(&args.snapshot)
        .with_context(|| format!("failed to read snapshot: {}", args.snapshot.display()))?;
    let assignment = IndexAssignment::discover(&records, &config.catalog)
        .context("failed to assign leaf indices")?;
    let hasher = HashBackend::from_algorithm(config.tree.hash)?;
    let (tree, stats) = TreeBuilder::new(&config.tree)
        .build(hasher, &config.catalog, &assignment, &records)
        .context("tree build failed")?;

    PersistedTree::from_tree(&tree)
        .save(&args.out)
        .with_context(|| format!("failed to write tree: {}", args.out.display()))?;
    if let Some(path) = &args.assignment_out {
        assignment
            .save(path)
            .with_context(|| format!("failed to write assignment: {}", path.display()))?;
    }

    println!("Merkle root: {}", tree.root());
    println!("  records:    {}", records.len());
    println!("  leaves:     {}", stats.leaves);
    println!("  duplicates: {}", stats.duplicates);
    if stats.overwritten > 0 {
        println!("  overwritten: {}", stats.overwritten);
    }
    println!("  hash:       {}", config.tree.hash);
    println!("  written:    {}", args.out.display());
    Ok(EXIT_OK)
}
