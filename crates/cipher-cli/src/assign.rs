//! # Assign — Emit the Index Assignment

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use cipher_core::Config;
use cipher_tree::{load_snapshot, IndexAssignment};

use crate::{emit, EXIT_OK};

/// Arguments for `cipher assign`.
#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Finalized enrollment snapshot (CSV).
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Output file; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute `cipher assign`.
pub fn run_assign(args: &AssignArgs, config: &Config) -> Result<u8> {
    let records = load_snapshot(&args.snapshot)
        .with_context(|| format!("failed to read snapshot: {}", args.snapshot.display()))?;
    let assignment = IndexAssignment::discover(&records, &config.catalog)
        .context("failed to assign leaf indices")?;
    let json = serde_json::to_string_pretty(&assignment)?;
    emit(&json, args.out.as_deref())?;
    if let Some(path) = &args.out {
        eprintln!(
            "{} colleges, {} slots written to {}",
            assignment.colleges().len(),
            assignment.slot_count(),
            path.display()
        );
    }
    Ok(EXIT_OK)
}
