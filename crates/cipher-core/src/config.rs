//! # Configuration
//!
//! A single YAML document configures a build: the lookup catalog and the
//! tree parameters. Every field is optional and defaults to the values of
//! the original campus deployment.
//!
//! ```yaml
//! catalog:
//!   courses: { "101": 0, "102": 1 }
//! tree:
//!   depth: 18
//!   hash: poseidon-bn254
//!   collisions: reject
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{CipherError, ConfigError};
use crate::field::{FieldElement, DEFAULT_ZERO_VALUE_HEX};
use crate::index::INDEX_BITS;

/// Deepest tree the sparse implementation supports.
pub const MAX_TREE_DEPTH: u32 = 32;

/// The hash primitive used for leaves and internal nodes.
///
/// Every persisted tree carries this tag so a dump is never re-derived
/// with a different primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    /// Circom-compatible Poseidon over the BN254 scalar field.
    #[default]
    PoseidonBn254,
    /// SHA-256 reduced modulo the BN254 scalar prime.
    Sha256,
}

impl HashAlgorithm {
    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PoseidonBn254 => "poseidon-bn254",
            Self::Sha256 => "sha256",
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the batch builder does when two different leaves land on one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Abort the build with a consistency error.
    #[default]
    Reject,
    /// Keep the leaf sorted last and log a warning.
    LastWriteWins,
}

/// Tree parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TreeSettings {
    /// Number of levels between the leaves and the root.
    pub depth: u32,
    /// Default leaf for every unwritten position.
    pub zero_value: FieldElement,
    /// Hash primitive.
    pub hash: HashAlgorithm,
    /// Duplicate-index handling.
    pub collisions: CollisionPolicy,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            depth: INDEX_BITS,
            zero_value: default_zero_value(),
            hash: HashAlgorithm::default(),
            collisions: CollisionPolicy::default(),
        }
    }
}

impl TreeSettings {
    /// Check the depth is supported and wide enough for packed indices.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth == 0 || self.depth > MAX_TREE_DEPTH {
            return Err(ConfigError::UnsupportedDepth {
                depth: self.depth,
                max: MAX_TREE_DEPTH,
            });
        }
        crate::index::ensure_depth(self.depth)
    }
}

/// The sentinel zero leaf.
pub fn default_zero_value() -> FieldElement {
    // The constant is a checked literal; parsing cannot fail.
    FieldElement::parse(DEFAULT_ZERO_VALUE_HEX).unwrap_or(FieldElement::ZERO)
}

/// Complete build configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Lookup tables.
    pub catalog: Catalog,
    /// Tree parameters.
    pub tree: TreeSettings,
}

impl Config {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.tree.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self, CipherError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml_str(&text)?)
    }
}
