//! # Tree Builder
//!
//! Batch construction of the commitment tree from a finalized snapshot.
//!
//! 1. Every record is located through the [`IndexAssignment`] and its leaf
//!    commitment computed, giving `(index, leaf)` pairs.
//! 2. Pairs are sorted by index (stable). Identical duplicates collapse;
//!    distinct leaves on one index are resolved by the [`CollisionPolicy`].
//! 3. A single ascending sweep writes the sentinel leaf into every gap
//!    below the highest occupied index, then each occupied leaf.
//!
//! Positions above the highest occupied index are never written; they
//! resolve to the zero table on demand.

use cipher_core::index::ensure_depth;
use cipher_core::{
    Catalog, CipherError, CollisionPolicy, ConsistencyError, EnrollmentRecord, FieldElement,
    TreeSettings,
};
use cipher_crypto::{build_leaf, FieldHasher, LeafInputs, SparseMerkleTree};

use crate::assignment::{IndexAssignment, Location};

/// Leaf commitment inputs for a record at a known location.
pub fn leaf_inputs(
    catalog: &Catalog,
    record: &EnrollmentRecord,
    location: &Location,
) -> Result<LeafInputs, CipherError> {
    let (pk_x, pk_y) = record.credential.point()?;
    Ok(LeafInputs {
        pk_x,
        pk_y,
        professor: catalog.professor_code(&record.professor)?,
        grade: catalog.grade_code(&record.grade)?,
        major: location.major,
    })
}

/// Locate a record and compute its leaf commitment.
pub fn commit_record<H: FieldHasher + ?Sized>(
    hasher: &H,
    catalog: &Catalog,
    assignment: &IndexAssignment,
    record: &EnrollmentRecord,
) -> Result<(Location, FieldElement), CipherError> {
    let location = assignment.locate(catalog, record)?;
    let inputs = leaf_inputs(catalog, record, &location)?;
    Ok((location, build_leaf(hasher, &inputs)?))
}

/// Summary of one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Distinct occupied positions.
    pub leaves: usize,
    /// Gap positions filled with the sentinel.
    pub gaps_filled: u64,
    /// Identical duplicates dropped.
    pub duplicates: usize,
    /// Distinct leaves discarded under last-write-wins.
    pub overwritten: usize,
}

/// Batch tree construction with fixed tree parameters.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    depth: u32,
    zero_value: FieldElement,
    collisions: CollisionPolicy,
}

impl TreeBuilder {
    /// Builder for configured tree settings.
    pub fn new(settings: &TreeSettings) -> Self {
        Self {
            depth: settings.depth,
            zero_value: settings.zero_value,
            collisions: settings.collisions,
        }
    }

    /// Builder with explicit parameters.
    pub fn with_params(depth: u32, zero_value: FieldElement, collisions: CollisionPolicy) -> Self {
        Self {
            depth,
            zero_value,
            collisions,
        }
    }

    /// Build from enrollment records against a fixed assignment.
    pub fn build<H: FieldHasher>(
        &self,
        hasher: H,
        catalog: &Catalog,
        assignment: &IndexAssignment,
        records: &[EnrollmentRecord],
    ) -> Result<(SparseMerkleTree<H>, BuildStats), CipherError> {
        ensure_depth(self.depth)?;
        let mut pairs = Vec::with_capacity(records.len());
        for record in records {
            let (location, leaf) = commit_record(&hasher, catalog, assignment, record)?;
            pairs.push((location.index.value(), leaf));
        }
        self.build_from_pairs(hasher, pairs)
    }

    /// Build from raw `(position, leaf)` pairs.
    pub fn build_from_pairs<H: FieldHasher>(
        &self,
        hasher: H,
        mut pairs: Vec<(u64, FieldElement)>,
    ) -> Result<(SparseMerkleTree<H>, BuildStats), CipherError> {
        let mut tree = SparseMerkleTree::new(self.depth, self.zero_value, hasher)?;
        pairs.sort_by_key(|(position, _)| *position);

        let mut stats = BuildStats {
            leaves: 0,
            gaps_filled: 0,
            duplicates: 0,
            overwritten: 0,
        };
        let mut resolved: Vec<(u64, FieldElement)> = Vec::with_capacity(pairs.len());
        for (position, leaf) in pairs {
            if let Some((last_pos, last_leaf)) = resolved.last_mut() {
                if *last_pos == position {
                    if *last_leaf == leaf {
                        stats.duplicates += 1;
                        tracing::debug!(position, "collapsed identical leaf");
                        continue;
                    }
                    match self.collisions {
                        CollisionPolicy::Reject => {
                            return Err(ConsistencyError::IndexCollision {
                                position,
                                first: *last_leaf,
                                second: leaf,
                            }
                            .into());
                        }
                        CollisionPolicy::LastWriteWins => {
                            tracing::warn!(
                                position,
                                discarded = %last_leaf,
                                kept = %leaf,
                                "index collision; keeping later leaf"
                            );
                            stats.overwritten += 1;
                            *last_leaf = leaf;
                            continue;
                        }
                    }
                }
            }
            resolved.push((position, leaf));
        }

        let zero = self.zero_value;
        let mut next = 0u64;
        for (position, leaf) in &resolved {
            while next < *position {
                tree.insert_at(next, zero)?;
                stats.gaps_filled += 1;
                next += 1;
            }
            tree.insert_at(*position, *leaf)?;
            next = position + 1;
        }
        stats.leaves = resolved.len();

        tracing::info!(
            root = %tree.root(),
            leaves = stats.leaves,
            gaps = stats.gaps_filled,
            nodes = tree.stored_nodes(),
            "tree built"
        );
        Ok((tree, stats))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use cipher_crypto::Sha256Field;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn batch_build_matches_direct_inserts(
            leaves in proptest::collection::btree_map(0u64..64, 1u64..1_000_000, 1..16),
            reverse in any::<bool>(),
        ) {
            let zero = FieldElement::from_u64(9);
            let mut pairs: Vec<(u64, FieldElement)> = leaves
                .iter()
                .map(|(p, v)| (*p, FieldElement::from_u64(*v)))
                .collect();
            if reverse {
                pairs.reverse();
            }
            let (built, stats) = TreeBuilder::with_params(6, zero, CollisionPolicy::Reject)
                .build_from_pairs(Sha256Field, pairs)
                .unwrap();

            let mut direct = SparseMerkleTree::new(6, zero, Sha256Field).unwrap();
            for (p, v) in &leaves {
                direct.insert_at(*p, FieldElement::from_u64(*v)).unwrap();
            }
            prop_assert_eq!(built.root(), direct.root());

            let highest = *leaves.keys().next_back().unwrap();
            prop_assert_eq!(stats.leaves, leaves.len());
            prop_assert_eq!(stats.gaps_filled, highest + 1 - leaves.len() as u64);
        }
    }
}
