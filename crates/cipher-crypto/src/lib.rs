//! # cipher-crypto — Hashing, Leaf Commitments and the Sparse Merkle Tree
//!
//! Provides the cryptographic engine of the enrollment commitment tree:
//!
//! - **Field hashing** (`hash`): the domain-tagged `hash2` primitive with
//!   Poseidon/BN254 and SHA-256 backends behind the [`FieldHasher`] trait.
//! - **Leaf commitments** (`leaf`): the fixed three-stage hash chain over a
//!   student's public key and review attributes.
//! - **Sparse Merkle tree** (`smt`): fixed-depth storage of written nodes,
//!   zero-table defaults, path proofs and root verification.
//!
//! ## Crate Policy
//!
//! - Depends only on `cipher-core` internally.
//! - No I/O. Persistence and record handling live in `cipher-tree`.

pub mod hash;
pub mod leaf;
pub mod smt;

pub use hash::{DomainTag, FieldHasher, HashBackend, PoseidonBn254, Sha256Field};
pub use leaf::{build_leaf, HashExpr, LeafInputs};
pub use smt::{
    compute_root, verify, verify_proof, zero_table, MerkleProof, NodeKey, SparseMerkleTree,
};
