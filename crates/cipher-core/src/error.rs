//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout the commitment tree workspace.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Configuration and encoding errors are fatal: they abort a batch build
//!   before any tree is published.
//! - Consistency errors are expected during normal operation (stale
//!   snapshots, tampered proofs) and always carry the mismatching values.
//! - Reading a position that was never written is not an error; it resolves
//!   to the zero table.

use thiserror::Error;

use crate::config::HashAlgorithm;
use crate::field::FieldElement;

/// Top-level error type for the workspace.
#[derive(Error, Debug)]
pub enum CipherError {
    /// Invalid configuration or lookup key.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A numeric input could not be encoded as a field element.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// The hash backend failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Sparse tree operation rejected.
    #[error("tree error: {0}")]
    Tree(#[from] TreeError),

    /// Recomputed values disagree with stored or published ones.
    #[error("consistency error: {0}")]
    Consistency(#[from] ConsistencyError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Fatal configuration problems detected before or during a build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The tree cannot address every packed index.
    #[error("tree depth {depth} cannot address packed indices; at least {required} levels required")]
    DepthTooSmall {
        /// Configured depth.
        depth: u32,
        /// Bits consumed by the packed index layout.
        required: u32,
    },

    /// Depth outside the supported range.
    #[error("tree depth {depth} outside supported range 1..={max}")]
    UnsupportedDepth {
        /// Configured depth.
        depth: u32,
        /// Largest supported depth.
        max: u32,
    },

    /// A packed-index sub-field exceeds its bit budget.
    #[error("{field} index {value} exceeds {bits}-bit budget (max {max})")]
    FieldOverflow {
        /// Name of the sub-field (college, department, course, slot).
        field: &'static str,
        /// Offending value.
        value: u64,
        /// Bit width of the sub-field.
        bits: u32,
        /// Largest permitted value.
        max: u64,
    },

    /// Course number missing from the fixed catalog.
    #[error("unknown course number: {0}")]
    UnknownCourse(String),

    /// Professor name missing from the catalog.
    #[error("unknown professor: {0}")]
    UnknownProfessor(String),

    /// Letter grade missing from the catalog.
    #[error("unknown grade: {0}")]
    UnknownGrade(String),

    /// A record references a college, department, major or occupant that
    /// the index assignment does not know.
    #[error("record not covered by index assignment: {0}")]
    Unassigned(String),

    /// Catalog or assignment content is self-inconsistent.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(String),
}

/// Errors converting numeric input into field elements.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// Input is not a decimal or `0x`-prefixed hex integer.
    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    /// Input does not fit below the field modulus.
    #[error("value {0} is not below the field modulus")]
    OutOfField(String),

    /// A 128-bit limb is too wide.
    #[error("limb {name} = {value} exceeds 128 bits")]
    LimbOverflow {
        /// Column name of the limb.
        name: &'static str,
        /// Offending value as text.
        value: String,
    },

    /// A required snapshot column is missing or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// Errors from the field hash primitive.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The hash backend rejected its inputs or parameters.
    #[error("hash failed: {0}")]
    HashFailed(String),

    /// A hash output could not be re-encoded.
    #[error("hash output encoding: {0}")]
    Encoding(#[from] EncodingError),
}

/// Errors from sparse tree operations.
#[derive(Error, Debug)]
pub enum TreeError {
    /// Position is not addressable at the tree's depth.
    #[error("position {position} out of range for depth {depth}")]
    PositionOutOfRange {
        /// Requested leaf position.
        position: u64,
        /// Tree depth.
        depth: u32,
    },

    /// Depth outside the supported range.
    #[error("unsupported tree depth {0}")]
    UnsupportedDepth(u32),

    /// A persisted storage key is malformed or out of range.
    #[error("invalid node key {0:?}")]
    InvalidNodeKey(String),

    /// Persisted nodes were computed with a different hash primitive.
    #[error("tree was built with {stored} but {supplied} was supplied")]
    HashMismatch {
        /// Algorithm recorded with the stored nodes.
        stored: HashAlgorithm,
        /// Algorithm of the hasher offered on restore.
        supplied: HashAlgorithm,
    },

    /// Hash backend failure while updating the tree.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Recomputed data disagrees with stored or published data.
///
/// Every variant carries the values on both sides so a caller can report
/// the mismatch instead of a bare `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    /// The stored leaf at a position differs from the recomputed commitment.
    #[error("leaf mismatch at position {position}: expected {expected}, stored {stored}")]
    LeafMismatch {
        /// Leaf position.
        position: u64,
        /// Commitment recomputed from the record.
        expected: FieldElement,
        /// Value found in the tree.
        stored: FieldElement,
    },

    /// The root recomputed from a proof differs from the expected root.
    #[error("root mismatch: computed {computed}, expected {expected}")]
    RootMismatch {
        /// Root recomputed from the proof path.
        computed: FieldElement,
        /// Published or expected root.
        expected: FieldElement,
    },

    /// A proof bundle is structurally invalid.
    #[error("malformed proof: {0}")]
    MalformedProof(String),

    /// Two different leaves were assigned to the same position.
    #[error("index collision at position {position}: {first} vs {second}")]
    IndexCollision {
        /// Contested position.
        position: u64,
        /// Leaf sorted first.
        first: FieldElement,
        /// Leaf sorted second.
        second: FieldElement,
    },
}

impl From<serde_json::Error> for CipherError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
