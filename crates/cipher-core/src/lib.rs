//! # cipher-core — Foundational Types for the Enrollment Commitment Tree
//!
//! This crate is the bedrock of the workspace. It defines the value types
//! every other crate passes around and the error taxonomy they report
//! through. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Canonical field elements.** `FieldElement` can only hold values
//!    strictly below the BN254 scalar modulus; encoding errors surface at
//!    the boundary, never inside the tree.
//!
//! 2. **Pure index packing.** `PackedIndex::pack()` is a function of four
//!    coordinates and nothing else. Discovery-order state lives in an
//!    explicit assignment (see `cipher-tree`), not in the packer.
//!
//! 3. **Catalogs are configuration.** Professor, grade and course tables are
//!    immutable values passed in, never process-wide constants.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cipher-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod catalog;
pub mod config;
pub mod error;
pub mod field;
pub mod index;
pub mod record;

// Re-export primary types for ergonomic imports.
pub use catalog::{Catalog, CatalogSpec};
pub use config::{CollisionPolicy, Config, HashAlgorithm, TreeSettings, MAX_TREE_DEPTH};
pub use error::{CipherError, ConfigError, ConsistencyError, CryptoError, EncodingError, TreeError};
pub use field::FieldElement;
pub use index::{IndexCoordinates, PackedIndex, INDEX_BITS};
pub use record::{Credential, EnrollmentRecord};
