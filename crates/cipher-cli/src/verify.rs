//! # Verify — Check a Saved Merkle Proof
//!
//! The proof file names the hash it was built with. Untagged files are
//! checked with the hash selected by `--config`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cipher_core::Config;
use cipher_crypto::HashBackend;
use cipher_tree::{RootCheck, SavedProof};

use crate::{parse_root, EXIT_MISMATCH, EXIT_OK};

/// Arguments for `cipher verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Merkle proof JSON, as written by `cipher prove --proof-out`.
    #[arg(long)]
    pub proof: PathBuf,

    /// Root the proof must lead to.
    #[arg(long)]
    pub root: String,
}

/// Execute `cipher verify`.
pub fn run_verify(args: &VerifyArgs, config: &Config) -> Result<u8> {
    let text = std::fs::read_to_string(&args.proof)
        .with_context(|| format!("failed to read proof: {}", args.proof.display()))?;
    let saved: SavedProof = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse proof: {}", args.proof.display()))?;
    let expected = parse_root(&args.root)?;
    let algorithm = saved.algorithm_or(config.tree.hash);
    if algorithm != config.tree.hash {
        tracing::info!(proof = %algorithm, configured = %config.tree.hash, "using the proof's hash");
    }
    let hasher = HashBackend::from_algorithm(algorithm)?;

    let check = RootCheck::of(&hasher, &saved.proof, expected).context("malformed proof")?;
    println!("  position:      {}", saved.proof.position);
    println!("  hash:          {algorithm}");
    println!("  computed_root: {}", check.computed);
    println!("  expected_root: {}", check.expected);
    println!("  valid:         {}", check.is_valid());
    Ok(if check.is_valid() { EXIT_OK } else { EXIT_MISMATCH })
}
