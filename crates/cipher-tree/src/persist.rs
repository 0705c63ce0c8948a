//! # Persisted Tree State
//!
//! The JSON dump written after a build and read back for root checks and
//! proof extraction:
//!
//! ```json
//! {
//!   "depth": 18,
//!   "zeroValue": "0x18d8…bd63",
//!   "hash": "poseidon-bn254",
//!   "storage": [["0-0", "0x…"], ["0-1", "0x…"], …]
//! }
//! ```
//!
//! `levels` is accepted for `depth`, and a missing `hash` means Poseidon,
//! so dumps from earlier tooling load unchanged. Storage is written in
//! `(level, position)` order; the zero table is re-derived on load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use cipher_core::{CipherError, FieldElement, HashAlgorithm, TreeError};
use cipher_crypto::{FieldHasher, HashBackend, NodeKey, SparseMerkleTree};

use crate::extractor::RootCheck;

/// Serialized sparse tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedTree {
    /// Tree depth.
    #[serde(alias = "levels")]
    pub depth: u32,
    /// Sentinel leaf.
    pub zero_value: FieldElement,
    /// Hash primitive the nodes were computed with.
    #[serde(default)]
    pub hash: HashAlgorithm,
    /// Stored nodes as `["level-position", value]`.
    pub storage: Vec<(String, FieldElement)>,
}

impl PersistedTree {
    /// Snapshot a tree.
    pub fn from_tree<H: FieldHasher>(tree: &SparseMerkleTree<H>) -> Self {
        Self {
            depth: tree.depth(),
            zero_value: tree.zero_value(),
            hash: tree.hasher().algorithm(),
            storage: tree.entries().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }

    fn nodes(&self) -> Result<Vec<(NodeKey, FieldElement)>, TreeError> {
        let mut nodes = Vec::with_capacity(self.storage.len());
        for (key, value) in &self.storage {
            nodes.push((key.parse::<NodeKey>()?, *value));
        }
        nodes.sort_by_key(|(k, _)| *k);
        if let Some(pair) = nodes.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(TreeError::InvalidNodeKey(format!("duplicate key {}", pair[0].0)));
        }
        Ok(nodes)
    }

    /// Rebuild with the backend named in the dump.
    pub fn restore(&self) -> Result<SparseMerkleTree<HashBackend>, CipherError> {
        self.restore_with(HashBackend::from_algorithm(self.hash)?)
    }

    /// Rebuild with a caller-supplied hasher of the same algorithm.
    pub fn restore_with<H: FieldHasher>(&self, hasher: H) -> Result<SparseMerkleTree<H>, CipherError> {
        if hasher.algorithm() != self.hash {
            return Err(TreeError::HashMismatch {
                stored: self.hash,
                supplied: hasher.algorithm(),
            }
            .into());
        }
        let tree = SparseMerkleTree::from_entries(self.depth, self.zero_value, hasher, self.nodes()?)?;
        tracing::info!(depth = self.depth, nodes = self.storage.len(), root = %tree.root(), "tree restored");
        Ok(tree)
    }

    /// Rehash every stored leaf into a fresh tree and compare the result
    /// with the stored root. Catches dumps whose interior nodes were edited
    /// or truncated.
    pub fn recompute(&self) -> Result<RootCheck, CipherError> {
        let stored = self.restore()?;
        let mut fresh = SparseMerkleTree::new(
            self.depth,
            self.zero_value,
            HashBackend::from_algorithm(self.hash)?,
        )?;
        for (key, value) in stored.entries().filter(|(k, _)| k.level == 0) {
            fresh.insert_at(key.position, value)?;
        }
        Ok(RootCheck {
            computed: fresh.root(),
            expected: stored.root(),
        })
    }

    /// Parse a JSON dump.
    pub fn from_json_str(text: &str) -> Result<Self, CipherError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, CipherError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a dump from disk.
    pub fn load(path: &Path) -> Result<Self, CipherError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Write a dump to disk.
    pub fn save(&self, path: &Path) -> Result<(), CipherError> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_crypto::{PoseidonBn254, Sha256Field};

    fn sample_tree() -> SparseMerkleTree<Sha256Field> {
        let mut tree = SparseMerkleTree::new(6, FieldElement::from_u64(42), Sha256Field).unwrap();
        for p in [0u64, 1, 2, 9, 40] {
            tree.insert_at(p, FieldElement::from_u64(p + 100)).unwrap();
        }
        tree
    }

    #[test]
    fn roundtrip_preserves_root_and_proofs() {
        let tree = sample_tree();
        let dump = PersistedTree::from_tree(&tree);
        assert_eq!(dump.hash, HashAlgorithm::Sha256);
        let json = dump.to_json_string().unwrap();
        let reloaded = PersistedTree::from_json_str(&json).unwrap().restore().unwrap();
        assert_eq!(reloaded.root(), tree.root());
        assert_eq!(reloaded.zeros(), tree.zeros());
        for p in [0u64, 1, 2, 9, 40, 63] {
            assert_eq!(reloaded.proof(p).unwrap(), tree.proof(p).unwrap());
        }
    }

    #[test]
    fn storage_is_sorted_and_keyed() {
        let dump = PersistedTree::from_tree(&sample_tree());
        assert_eq!(dump.storage[0].0, "0-0");
        let keys: Vec<NodeKey> = dump.storage.iter().map(|(k, _)| k.parse().unwrap()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.last().unwrap(), &NodeKey::new(6, 0));
    }

    #[test]
    fn json_field_names() {
        let json = PersistedTree::from_tree(&sample_tree()).to_json_string().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["depth"], 6);
        assert_eq!(v["hash"], "sha256");
        assert!(v["zeroValue"].as_str().unwrap().starts_with("0x"));
        assert!(v["storage"][0].is_array());
    }

    #[test]
    fn legacy_levels_key_and_default_hash() {
        let json = r#"{"levels": 18, "zeroValue": "0x01", "storage": []}"#;
        let dump = PersistedTree::from_json_str(json).unwrap();
        assert_eq!(dump.depth, 18);
        assert_eq!(dump.hash, HashAlgorithm::PoseidonBn254);
        let tree = dump.restore().unwrap();
        assert_eq!(tree.root(), tree.zeros()[18]);
    }

    #[test]
    fn bad_keys_rejected() {
        for key in ["0_1", "7-0", "0-64", "x-1"] {
            let json = format!(r#"{{"depth": 6, "zeroValue": "0x01", "hash": "sha256", "storage": [["{key}", "0x02"]]}}"#);
            let dump = PersistedTree::from_json_str(&json).unwrap();
            assert!(
                matches!(dump.restore(), Err(CipherError::Tree(TreeError::InvalidNodeKey(_)))),
                "{key}"
            );
        }
    }

    #[test]
    fn duplicate_keys_rejected() {
        let json = r#"{"depth": 6, "zeroValue": "0x01", "hash": "sha256",
            "storage": [["0-1", "0x02"], ["0-1", "0x03"]]}"#;
        let dump = PersistedTree::from_json_str(json).unwrap();
        assert!(dump.restore().is_err());
    }

    #[test]
    fn out_of_field_value_rejected() {
        let json = r#"{"depth": 6, "zeroValue": "0x01", "storage": [["0-1",
            "0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001"]]}"#;
        assert!(PersistedTree::from_json_str(json).is_err());
    }

    #[test]
    fn hasher_mismatch_rejected() {
        let dump = PersistedTree::from_tree(&sample_tree());
        let poseidon = PoseidonBn254::new().unwrap();
        assert!(matches!(
            dump.restore_with(poseidon),
            Err(CipherError::Tree(TreeError::HashMismatch {
                stored: HashAlgorithm::Sha256,
                supplied: HashAlgorithm::PoseidonBn254,
            }))
        ));
    }

    #[test]
    fn recompute_detects_edited_interior_node() {
        let dump = PersistedTree::from_tree(&sample_tree());
        assert!(dump.recompute().unwrap().is_valid());

        let mut edited = dump.clone();
        let root_entry = edited
            .storage
            .iter_mut()
            .find(|(k, _)| k == "6-0")
            .unwrap();
        root_entry.1 = FieldElement::from_u64(1);
        assert!(!edited.recompute().unwrap().is_valid());
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full_tree.json");
        let dump = PersistedTree::from_tree(&sample_tree());
        dump.save(&path).unwrap();
        assert_eq!(PersistedTree::load(&path).unwrap(), dump);
    }
}
