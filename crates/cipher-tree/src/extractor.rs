//! # Proof Extraction
//!
//! Recomputes a record's location and leaf, checks the tree actually holds
//! that leaf, and returns the sibling path. A mismatch means the tree was
//! built from a different snapshot (or the record was edited) and is
//! reported as a [`ConsistencyError::LeafMismatch`], never a panic.

use serde::{Deserialize, Serialize};

use cipher_core::{
    Catalog, CipherError, ConsistencyError, EnrollmentRecord, FieldElement, HashAlgorithm,
};
use cipher_crypto::{compute_root, FieldHasher, LeafInputs, MerkleProof, SparseMerkleTree};

use crate::assignment::{IndexAssignment, Location};
use crate::builder::leaf_inputs;

/// A verified-against-storage membership proof for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipProof {
    /// Where the record sits.
    pub location: Location,
    /// Values committed into the leaf.
    pub inputs: LeafInputs,
    /// Path from the leaf to the root.
    pub proof: MerkleProof,
}

/// Extract a membership proof for `record`.
pub fn prove_membership<H: FieldHasher>(
    tree: &SparseMerkleTree<H>,
    catalog: &Catalog,
    assignment: &IndexAssignment,
    record: &EnrollmentRecord,
) -> Result<MembershipProof, CipherError> {
    let location = assignment.locate(catalog, record)?;
    let inputs = leaf_inputs(catalog, record, &location)?;
    let expected = cipher_crypto::build_leaf(tree.hasher(), &inputs)?;
    let position = location.index.value();
    let stored = tree.leaf(position)?;
    if stored != expected {
        return Err(ConsistencyError::LeafMismatch {
            position,
            expected,
            stored,
        }
        .into());
    }
    let proof = tree.proof(position)?;
    tracing::debug!(position, root = %proof.root, "membership proof extracted");
    Ok(MembershipProof {
        location,
        inputs,
        proof,
    })
}

/// A Merkle proof as written to disk, tagged with the hash it was built
/// with. Files without a tag predate it and leave the choice to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedProof {
    /// Hash primitive of the tree the proof was taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashAlgorithm>,
    /// The path itself.
    #[serde(flatten)]
    pub proof: MerkleProof,
}

impl SavedProof {
    /// Tag a proof with the hasher that produced it.
    pub fn new<H: FieldHasher + ?Sized>(hasher: &H, proof: MerkleProof) -> Self {
        Self {
            hash: Some(hasher.algorithm()),
            proof,
        }
    }

    /// The recorded algorithm, or `fallback` for untagged files.
    pub fn algorithm_or(&self, fallback: HashAlgorithm) -> HashAlgorithm {
        self.hash.unwrap_or(fallback)
    }
}

/// Recomputed root next to the root it should equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootCheck {
    /// Root folded from the proof path.
    pub computed: FieldElement,
    /// Published or supplied root.
    pub expected: FieldElement,
}

impl RootCheck {
    /// Fold a proof and pair it with the expected root.
    ///
    /// Only a structurally malformed proof is an error; a root mismatch is
    /// a normal, invalid result.
    pub fn of<H: FieldHasher + ?Sized>(
        hasher: &H,
        proof: &MerkleProof,
        expected: FieldElement,
    ) -> Result<Self, CipherError> {
        Ok(Self {
            computed: compute_root(hasher, proof)?,
            expected,
        })
    }

    /// Whether the roots agree.
    pub fn is_valid(&self) -> bool {
        self.computed == self.expected
    }

    /// The mismatch as an error, if any.
    pub fn into_result(self) -> Result<FieldElement, ConsistencyError> {
        if self.is_valid() {
            Ok(self.computed)
        } else {
            Err(ConsistencyError::RootMismatch {
                computed: self.computed,
                expected: self.expected,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;
    use crate::fixtures::{record, sample_records};
    use cipher_core::{CollisionPolicy, ConfigError};
    use cipher_crypto::Sha256Field;

    fn built() -> (SparseMerkleTree<Sha256Field>, IndexAssignment, Vec<EnrollmentRecord>) {
        let catalog = Catalog::default();
        // single college keeps positions low
        let records: Vec<_> = sample_records()
            .into_iter()
            .filter(|r| r.college == "ENG")
            .collect();
        let assignment = IndexAssignment::discover(&records, &catalog).unwrap();
        let (tree, _) = TreeBuilder::with_params(18, FieldElement::from_u64(3), CollisionPolicy::Reject)
            .build(Sha256Field, &catalog, &assignment, &records)
            .unwrap();
        (tree, assignment, records)
    }

    #[test]
    fn proof_for_every_record_checks_out() {
        let (tree, assignment, records) = built();
        let catalog = Catalog::default();
        for r in &records {
            let m = prove_membership(&tree, &catalog, &assignment, r).unwrap();
            assert_eq!(m.proof.position, m.location.index.value());
            let check = RootCheck::of(&Sha256Field, &m.proof, tree.root()).unwrap();
            assert!(check.is_valid());
            assert_eq!(check.into_result().unwrap(), tree.root());
        }
    }

    #[test]
    fn edited_record_reports_leaf_mismatch() {
        let (tree, _, records) = built();
        let catalog = Catalog::default();
        // numbering differs from the one the tree was built with
        let other = IndexAssignment::discover(
            &[records[1].clone(), records[0].clone()],
            &catalog,
        )
        .unwrap();
        let err = prove_membership(&tree, &catalog, &other, &records[1]).unwrap_err();
        assert!(matches!(
            err,
            CipherError::Consistency(ConsistencyError::LeafMismatch { position: 0, .. })
        ));
    }

    #[test]
    fn unknown_record_is_config_error() {
        let (tree, assignment, _) = built();
        let stranger = record("ENG", "CS", "101", 777, "Dr. Alice Smith", "A", "CS");
        let err = prove_membership(&tree, &Catalog::default(), &assignment, &stranger).unwrap_err();
        assert!(matches!(err, CipherError::Config(ConfigError::Unassigned(_))));
    }

    #[test]
    fn saved_proof_carries_hash_tag() {
        let (tree, assignment, records) = built();
        let m = prove_membership(&tree, &Catalog::default(), &assignment, &records[0]).unwrap();
        let saved = SavedProof::new(tree.hasher(), m.proof.clone());
        let json = serde_json::to_value(&saved).unwrap();
        assert_eq!(json["hash"], "sha256");
        assert_eq!(json["position"], 0);
        let back: SavedProof = serde_json::from_value(json).unwrap();
        assert_eq!(back, saved);
        assert_eq!(back.algorithm_or(HashAlgorithm::PoseidonBn254), HashAlgorithm::Sha256);

        let untagged = serde_json::to_string(&m.proof).unwrap();
        let legacy: SavedProof = serde_json::from_str(&untagged).unwrap();
        assert_eq!(legacy.hash, None);
        assert_eq!(legacy.proof, m.proof);
        assert_eq!(legacy.algorithm_or(HashAlgorithm::PoseidonBn254), HashAlgorithm::PoseidonBn254);
    }

    #[test]
    fn wrong_expected_root_is_invalid_not_error() {
        let (tree, assignment, records) = built();
        let m = prove_membership(&tree, &Catalog::default(), &assignment, &records[0]).unwrap();
        let check = RootCheck::of(&Sha256Field, &m.proof, FieldElement::from_u64(1)).unwrap();
        assert!(!check.is_valid());
        assert!(matches!(
            check.into_result(),
            Err(ConsistencyError::RootMismatch { .. })
        ));
    }
}
