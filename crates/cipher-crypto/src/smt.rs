//! # Sparse Merkle Tree
//!
//! A fixed-depth binary Merkle tree over `2^depth` leaf positions that
//! stores only the nodes it has written. Any absent node at level `l`
//! resolves to `zeros[l]`, where
//!
//! ```text
//! zeros[0]   = sentinel
//! zeros[i+1] = hash2(0, zeros[i], zeros[i])
//! ```
//!
//! Nodes are addressed by `(level, position)`: level 0 holds leaves, level
//! `depth` holds the single root at position 0. A node's children are
//! `(level-1, 2p)` and `(level-1, 2p+1)`.
//!
//! ## Proofs
//!
//! A [`MerkleProof`] lists one sibling per level, bottom-up, plus a
//! direction bit per level: `1` when the node being extended is the right
//! child. Verification folds the leaf through the siblings and compares
//! the result against an expected root.
//!
//! ## Security Invariant
//!
//! Node values depend only on the committed leaves, never on insertion
//! history, so any order of `insert_at` calls over the same final
//! assignment produces the same root.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use cipher_core::{
    CipherError, ConsistencyError, CryptoError, FieldElement, TreeError, MAX_TREE_DEPTH,
};

use crate::hash::{DomainTag, FieldHasher};

// ---------------------------------------------------------------------------
// Node addressing
// ---------------------------------------------------------------------------

/// Address of a stored node.
///
/// Ordered by level, then position, which is also the persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey {
    /// Height above the leaves (0 = leaf).
    pub level: u32,
    /// Position within the level.
    pub position: u64,
}

impl NodeKey {
    /// Construct a key.
    pub fn new(level: u32, position: u64) -> Self {
        Self { level, position }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.level, self.position)
    }
}

impl FromStr for NodeKey {
    type Err = TreeError;

    /// Parse the `"level-position"` storage key form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TreeError::InvalidNodeKey(s.to_string());
        let (level, position) = s.split_once('-').ok_or_else(invalid)?;
        let level = level.parse::<u32>().map_err(|_| invalid())?;
        let position = position.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self { level, position })
    }
}

// ---------------------------------------------------------------------------
// Zero table
// ---------------------------------------------------------------------------

/// Default node values for every level, `depth + 1` entries.
pub fn zero_table<H: FieldHasher + ?Sized>(
    hasher: &H,
    sentinel: FieldElement,
    depth: u32,
) -> Result<Vec<FieldElement>, CryptoError> {
    let mut zeros = Vec::with_capacity(depth as usize + 1);
    zeros.push(sentinel);
    for level in 0..depth as usize {
        let z = zeros[level];
        zeros.push(hasher.hash2(DomainTag::DEFAULT, &z, &z)?);
    }
    Ok(zeros)
}

fn ordered(
    position: u64,
    current: FieldElement,
    sibling: FieldElement,
) -> (FieldElement, FieldElement) {
    if position & 1 == 1 {
        (sibling, current)
    } else {
        (current, sibling)
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Sparse Merkle tree over a pluggable field hasher.
#[derive(Debug)]
pub struct SparseMerkleTree<H> {
    depth: u32,
    zeros: Vec<FieldElement>,
    nodes: BTreeMap<NodeKey, FieldElement>,
    hasher: H,
}

impl<H: FieldHasher> SparseMerkleTree<H> {
    /// Create an empty tree and derive its zero table.
    pub fn new(depth: u32, sentinel: FieldElement, hasher: H) -> Result<Self, TreeError> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(TreeError::UnsupportedDepth(depth));
        }
        let zeros = zero_table(&hasher, sentinel, depth)?;
        Ok(Self {
            depth,
            zeros,
            nodes: BTreeMap::new(),
            hasher,
        })
    }

    /// Rebuild a tree from previously persisted nodes.
    ///
    /// Every key must address a node that exists at this depth. Values are
    /// taken as-is; the zero table is re-derived from the sentinel.
    pub fn from_entries<I>(
        depth: u32,
        sentinel: FieldElement,
        hasher: H,
        entries: I,
    ) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = (NodeKey, FieldElement)>,
    {
        let mut tree = Self::new(depth, sentinel, hasher)?;
        for (key, value) in entries {
            if key.level > depth || key.position >= 1u64 << (depth - key.level) {
                return Err(TreeError::InvalidNodeKey(key.to_string()));
            }
            tree.nodes.insert(key, value);
        }
        tracing::debug!(depth, nodes = tree.nodes.len(), "restored sparse tree");
        Ok(tree)
    }

    /// Levels between leaves and root.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of addressable leaf positions.
    pub fn capacity(&self) -> u64 {
        1u64 << self.depth
    }

    /// The default value per level, `zeros[0]` being the sentinel leaf.
    pub fn zeros(&self) -> &[FieldElement] {
        &self.zeros
    }

    /// The sentinel leaf.
    pub fn zero_value(&self) -> FieldElement {
        self.zeros[0]
    }

    /// The hash backend.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Count of explicitly stored nodes.
    pub fn stored_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Stored nodes in `(level, position)` order.
    pub fn entries(&self) -> impl Iterator<Item = (NodeKey, FieldElement)> + '_ {
        self.nodes.iter().map(|(k, v)| (*k, *v))
    }

    /// Value at a node, falling back to the level default.
    pub fn node(&self, level: u32, position: u64) -> FieldElement {
        self.nodes
            .get(&NodeKey::new(level, position))
            .copied()
            .unwrap_or(self.zeros[level as usize])
    }

    fn check_position(&self, position: u64) -> Result<(), TreeError> {
        if position >= self.capacity() {
            return Err(TreeError::PositionOutOfRange {
                position,
                depth: self.depth,
            });
        }
        Ok(())
    }

    /// Write a leaf and rehash its path to the root. Returns the new root.
    pub fn insert_at(&mut self, position: u64, leaf: FieldElement) -> Result<FieldElement, TreeError> {
        self.check_position(position)?;
        let mut pos = position;
        let mut current = leaf;
        for level in 0..self.depth {
            self.nodes.insert(NodeKey::new(level, pos), current);
            let sibling = self.node(level, pos ^ 1);
            let (left, right) = ordered(pos, current, sibling);
            current = self.hasher.hash2(DomainTag::DEFAULT, &left, &right)?;
            pos >>= 1;
        }
        self.nodes.insert(NodeKey::new(self.depth, 0), current);
        Ok(current)
    }

    /// Current root; `zeros[depth]` while the tree is empty.
    pub fn root(&self) -> FieldElement {
        self.node(self.depth, 0)
    }

    /// Leaf value at a position, default-resolved.
    pub fn leaf(&self, position: u64) -> Result<FieldElement, TreeError> {
        self.check_position(position)?;
        Ok(self.node(0, position))
    }

    /// Sibling path from a leaf to the root. Read-only.
    pub fn proof(&self, position: u64) -> Result<MerkleProof, TreeError> {
        self.check_position(position)?;
        let mut siblings = Vec::with_capacity(self.depth as usize);
        let mut directions = Vec::with_capacity(self.depth as usize);
        let mut pos = position;
        for level in 0..self.depth {
            siblings.push(self.node(level, pos ^ 1));
            directions.push((pos & 1) as u8);
            pos >>= 1;
        }
        Ok(MerkleProof {
            position,
            siblings,
            directions,
            leaf: self.node(0, position),
            root: self.root(),
        })
    }
}

// ---------------------------------------------------------------------------
// Proofs
// ---------------------------------------------------------------------------

/// Membership proof for one leaf position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Leaf position.
    pub position: u64,
    /// Sibling per level, leaf level first.
    pub siblings: Vec<FieldElement>,
    /// `1` where the path node is a right child.
    pub directions: Vec<u8>,
    /// Leaf value at `position`.
    pub leaf: FieldElement,
    /// Root at extraction time.
    pub root: FieldElement,
}

impl MerkleProof {
    /// Depth implied by the sibling count.
    pub fn depth(&self) -> usize {
        self.siblings.len()
    }

    /// Reject proofs whose shape cannot describe a path.
    pub fn check_shape(&self) -> Result<(), ConsistencyError> {
        let depth = self.siblings.len();
        if depth == 0 || depth > MAX_TREE_DEPTH as usize {
            return Err(ConsistencyError::MalformedProof(format!(
                "{depth} siblings; expected 1..={MAX_TREE_DEPTH}"
            )));
        }
        if self.directions.len() != depth {
            return Err(ConsistencyError::MalformedProof(format!(
                "{} direction bits for {depth} siblings",
                self.directions.len()
            )));
        }
        if self.position >= 1u64 << depth {
            return Err(ConsistencyError::MalformedProof(format!(
                "position {} exceeds depth {depth}",
                self.position
            )));
        }
        for (level, bit) in self.directions.iter().enumerate() {
            if u64::from(*bit) != (self.position >> level) & 1 {
                return Err(ConsistencyError::MalformedProof(format!(
                    "direction bit {level} disagrees with position {}",
                    self.position
                )));
            }
        }
        Ok(())
    }
}

/// Fold the proof's leaf through its siblings.
pub fn compute_root<H: FieldHasher + ?Sized>(
    hasher: &H,
    proof: &MerkleProof,
) -> Result<FieldElement, CipherError> {
    proof.check_shape()?;
    let mut current = proof.leaf;
    for (sibling, bit) in proof.siblings.iter().zip(&proof.directions) {
        let (left, right) = ordered(u64::from(*bit), current, *sibling);
        current = hasher.hash2(DomainTag::DEFAULT, &left, &right)?;
    }
    Ok(current)
}

/// Verify a proof against an expected root, reporting the mismatch.
pub fn verify_proof<H: FieldHasher + ?Sized>(
    hasher: &H,
    proof: &MerkleProof,
    expected_root: &FieldElement,
) -> Result<(), CipherError> {
    let computed = compute_root(hasher, proof)?;
    if computed != *expected_root {
        return Err(ConsistencyError::RootMismatch {
            computed,
            expected: *expected_root,
        }
        .into());
    }
    Ok(())
}

/// Boolean form of [`verify_proof`].
pub fn verify<H: FieldHasher + ?Sized>(
    hasher: &H,
    proof: &MerkleProof,
    expected_root: &FieldElement,
) -> bool {
    verify_proof(hasher, proof, expected_root).is_ok()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::hash::Sha256Field;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Every position verifies against the root after arbitrary inserts.
        #[test]
        fn proofs_verify_after_inserts(
            writes in proptest::collection::vec((0u64..256, 0u64..1_000_000), 1..24),
            probe in 0u64..256,
        ) {
            let mut tree = SparseMerkleTree::new(8, FieldElement::from_u64(7), Sha256Field).unwrap();
            for (pos, v) in &writes {
                tree.insert_at(*pos, FieldElement::from_u64(*v)).unwrap();
            }
            let root = tree.root();
            for (pos, _) in &writes {
                prop_assert!(verify(&Sha256Field, &tree.proof(*pos).unwrap(), &root));
            }
            prop_assert!(verify(&Sha256Field, &tree.proof(probe).unwrap(), &root));
        }

        /// The root depends only on the final assignment, not insertion order.
        #[test]
        fn root_is_order_independent(
            writes in proptest::collection::btree_map(0u64..256, 0u64..1_000_000, 1..24),
        ) {
            let final_state: BTreeMap<u64, u64> = writes;
            let mut forward = SparseMerkleTree::new(8, FieldElement::ZERO, Sha256Field).unwrap();
            for (pos, v) in final_state.iter() {
                forward.insert_at(*pos, FieldElement::from_u64(*v)).unwrap();
            }
            let mut reverse = SparseMerkleTree::new(8, FieldElement::ZERO, Sha256Field).unwrap();
            for (pos, v) in final_state.iter().rev() {
                reverse.insert_at(*pos, FieldElement::from_u64(*v)).unwrap();
            }
            prop_assert_eq!(forward.root(), reverse.root());
        }
    }
}
