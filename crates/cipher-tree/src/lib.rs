//! # cipher-tree — Batch Construction and Proof Extraction
//!
//! Turns a finalized enrollment snapshot into a persisted commitment tree
//! and extracts per-record membership proofs from it.
//!
//! ## Pipeline
//!
//! ```text
//! snapshot CSV ─► IndexAssignment::discover ─► TreeBuilder::build ─► PersistedTree
//!                                                                       │
//!                 ProverInputs ◄─ prove_membership ◄─ PersistedTree::restore
//! ```
//!
//! ## Crate Policy
//!
//! - First-seen numbering happens once, in [`IndexAssignment::discover`].
//!   Everything after it is a lookup.
//! - Consistency failures (stale tree, wrong root) are returned as
//!   `ConsistencyError` values for the caller to report.

pub mod assignment;
pub mod builder;
pub mod extractor;
pub mod persist;
pub mod prover;
pub mod snapshot;

#[cfg(test)]
mod fixtures;

pub use assignment::{CollegeAssignment, IndexAssignment, Location, Occupant};
pub use builder::{commit_record, leaf_inputs, BuildStats, TreeBuilder};
pub use extractor::{prove_membership, MembershipProof, RootCheck, SavedProof};
pub use persist::PersistedTree;
pub use prover::ProverInputs;
pub use snapshot::{load_snapshot, read_snapshot, RecordFilter};
