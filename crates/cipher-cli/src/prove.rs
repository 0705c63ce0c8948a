//! # Prove — Prover Inputs for One Snapshot Row
//!
//! Selects one row from the snapshot (by position or by field filters),
//! extracts its membership proof from the persisted tree and writes the
//! prover inputs. The root check (`computed_root`, `expected_root`,
//! `valid`) goes to stderr so stdout stays a clean `Prover.toml`.
//!
//! Without `--assignment` the index assignment is rediscovered from the
//! snapshot, which is only correct when the snapshot is the one the tree
//! was built from.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};

use cipher_core::Config;
use cipher_tree::{
    load_snapshot, prove_membership, IndexAssignment, PersistedTree, ProverInputs, RecordFilter,
    RootCheck, SavedProof,
};

use crate::{emit, parse_root, EXIT_MISMATCH, EXIT_OK};

/// Prover input encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// `Prover.toml`.
    #[default]
    Toml,
    /// Pretty JSON.
    Json,
}

/// Arguments for `cipher prove`.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Persisted tree to read.
    #[arg(long, default_value = "full_tree.json")]
    pub tree: PathBuf,

    /// Snapshot the tree was built from.
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Zero-based data row to prove. Defaults to the first matching row.
    #[arg(long)]
    pub row: Option<usize>,

    /// Select by college name.
    #[arg(long)]
    pub match_college: Option<String>,
    /// Select by department name.
    #[arg(long)]
    pub match_department: Option<String>,
    /// Select by course number.
    #[arg(long)]
    pub match_course: Option<String>,
    /// Select by professor name.
    #[arg(long)]
    pub match_professor: Option<String>,
    /// Select by letter grade.
    #[arg(long)]
    pub match_grade: Option<String>,
    /// Select by major name.
    #[arg(long)]
    pub match_major: Option<String>,
    /// Select by public key x coordinate (hex or decimal).
    #[arg(long)]
    pub match_pk_x: Option<String>,

    /// Saved index assignment from `cipher build --assignment-out`.
    #[arg(long)]
    pub assignment: Option<PathBuf>,

    /// Root to check against. Defaults to the root stored in the tree.
    #[arg(long)]
    pub expected_root: Option<String>,

    /// Output encoding for the prover inputs.
    #[arg(long, value_enum, default_value_t = InputFormat::Toml)]
    pub format: InputFormat,

    /// Prover input file; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Also write the Merkle proof (JSON, tagged with its hash) for `cipher verify`.
    #[arg(long)]
    pub proof_out: Option<PathBuf>,
}

impl ProveArgs {
    fn filter(&self) -> Result<RecordFilter> {
        let pk_x = match &self.match_pk_x {
            Some(text) => Some(parse_root(text).context("invalid --match-pk-x")?),
            None => None,
        };
        Ok(RecordFilter {
            college: self.match_college.clone(),
            department: self.match_department.clone(),
            course_number: self.match_course.clone(),
            professor: self.match_professor.clone(),
            grade: self.match_grade.clone(),
            major: self.match_major.clone(),
            pk_x,
        })
    }
}

/// Execute `cipher prove`.
pub fn run_prove(args: &ProveArgs, config: &Config) -> Result<u8> {
    let records = load_snapshot(&args.snapshot)
        .with_context(|| format!("failed to read snapshot: {}", args.snapshot.display()))?;
    let filter = args.filter()?;
    let row = match args.row {
        Some(_) if !filter.is_empty() => bail!("--row cannot be combined with --match-* filters"),
        Some(n) if n < records.len() => n,
        Some(n) => bail!("row {n} out of range: snapshot has {} rows", records.len()),
        None => filter
            .find(&records)
            .context("no snapshot row matches the given filters")?,
    };
    let record = &records[row];

    let assignment = match &args.assignment {
        Some(path) => IndexAssignment::load(path)
            .with_context(|| format!("failed to read assignment: {}", path.display()))?,
        None => IndexAssignment::discover(&records, &config.catalog)
            .context("failed to assign leaf indices")?,
    };
    let tree = PersistedTree::load(&args.tree)
        .and_then(|dump| dump.restore())
        .with_context(|| format!("failed to load tree: {}", args.tree.display()))?;

    let membership = prove_membership(&tree, &config.catalog, &assignment, record)
        .with_context(|| format!("row {row} is not committed in {}", args.tree.display()))?;

    let inputs = ProverInputs::new(&membership, record);
    let rendered = match args.format {
        InputFormat::Toml => inputs.to_toml()?,
        InputFormat::Json => inputs.to_json()?,
    };
    emit(&rendered, args.out.as_deref())?;
    if let Some(path) = &args.proof_out {
        let saved = SavedProof::new(tree.hasher(), membership.proof.clone());
        let json = serde_json::to_string_pretty(&saved)?;
        emit(&json, Some(path))?;
    }

    let expected = match &args.expected_root {
        Some(text) => parse_root(text)?,
        None => tree.root(),
    };
    let check = RootCheck::of(tree.hasher(), &membership.proof, expected)?;
    eprintln!("  row:           {row}");
    eprintln!("  leaf_index:    {}", inputs.leaf_index);
    eprintln!("  computed_root: {}", check.computed);
    eprintln!("  expected_root: {}", check.expected);
    eprintln!("  valid:         {}", check.is_valid());
    Ok(if check.is_valid() { EXIT_OK } else { EXIT_MISMATCH })
}
