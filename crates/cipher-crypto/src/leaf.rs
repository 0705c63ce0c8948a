//! # Leaf Commitment
//!
//! A leaf binds a student's public key to the review attributes committed
//! for their enrollment slot:
//!
//! ```text
//! leaf = H( H( H(pk_x, pk_y), H(professor, grade) ), major )
//! ```
//!
//! The chain is held as a small [`HashExpr`] tree rather than nested calls,
//! so the evaluation order (left subtree, right subtree, then the pair) is
//! explicit data. Changing the shape changes every root built from it.

use serde::{Deserialize, Serialize};

use cipher_core::{CryptoError, FieldElement};

use crate::hash::{DomainTag, FieldHasher};

/// A fixed-shape expression of pairwise hash calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HashExpr {
    /// A literal field element.
    Input {
        /// The value.
        value: FieldElement,
    },
    /// `hash2(tag, left, right)`.
    Pair {
        /// Domain tag for this call.
        tag: DomainTag,
        /// Left operand.
        left: Box<HashExpr>,
        /// Right operand.
        right: Box<HashExpr>,
    },
}

impl HashExpr {
    /// A literal leaf of the expression.
    pub fn input(value: FieldElement) -> Self {
        Self::Input { value }
    }

    /// A tag-0 pair node.
    pub fn pair(left: HashExpr, right: HashExpr) -> Self {
        Self::Pair {
            tag: DomainTag::DEFAULT,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Evaluate depth-first, left operand before right.
    pub fn eval<H: FieldHasher + ?Sized>(&self, hasher: &H) -> Result<FieldElement, CryptoError> {
        match self {
            Self::Input { value } => Ok(*value),
            Self::Pair { tag, left, right } => {
                let l = left.eval(hasher)?;
                let r = right.eval(hasher)?;
                hasher.hash2(*tag, &l, &r)
            }
        }
    }

    /// Number of hash invocations needed to evaluate.
    pub fn hash_count(&self) -> usize {
        match self {
            Self::Input { .. } => 0,
            Self::Pair { left, right, .. } => 1 + left.hash_count() + right.hash_count(),
        }
    }
}

/// Everything committed into one leaf, already encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafInputs {
    /// Public key x coordinate.
    pub pk_x: FieldElement,
    /// Public key y coordinate.
    pub pk_y: FieldElement,
    /// Professor code from the catalog.
    pub professor: u64,
    /// Grade code from the catalog.
    pub grade: u64,
    /// Major code within the college.
    pub major: u64,
}

impl LeafInputs {
    /// The commitment expression for these inputs.
    pub fn expr(&self) -> HashExpr {
        let identity = HashExpr::pair(HashExpr::input(self.pk_x), HashExpr::input(self.pk_y));
        let review = HashExpr::pair(
            HashExpr::input(FieldElement::from_u64(self.professor)),
            HashExpr::input(FieldElement::from_u64(self.grade)),
        );
        HashExpr::pair(
            HashExpr::pair(identity, review),
            HashExpr::input(FieldElement::from_u64(self.major)),
        )
    }
}

/// Compute the leaf commitment.
pub fn build_leaf<H: FieldHasher + ?Sized>(
    hasher: &H,
    inputs: &LeafInputs,
) -> Result<FieldElement, CryptoError> {
    inputs.expr().eval(hasher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{PoseidonBn254, Sha256Field};

    fn sample() -> LeafInputs {
        LeafInputs {
            pk_x: FieldElement::from_u64(11),
            pk_y: FieldElement::from_u64(22),
            professor: 4,
            grade: 6,
            major: 1,
        }
    }

    #[test]
    fn test_leaf_matches_manual_chain() {
        let h = Sha256Field;
        let t = DomainTag::DEFAULT;
        let i = sample();
        let a = h.hash2(t, &i.pk_x, &i.pk_y).unwrap();
        let b = h
            .hash2(t, &FieldElement::from_u64(4), &FieldElement::from_u64(6))
            .unwrap();
        let c = h.hash2(t, &a, &b).unwrap();
        let expected = h.hash2(t, &c, &FieldElement::from_u64(1)).unwrap();
        assert_eq!(build_leaf(&h, &i).unwrap(), expected);
    }

    #[test]
    fn test_leaf_uses_four_hashes() {
        assert_eq!(sample().expr().hash_count(), 4);
    }

    #[test]
    fn test_every_attribute_changes_leaf() {
        let h = PoseidonBn254::new().unwrap();
        let base = build_leaf(&h, &sample()).unwrap();
        let mut variants = Vec::new();
        let mut v = sample();
        v.pk_x = FieldElement::from_u64(12);
        variants.push(v);
        let mut v = sample();
        v.pk_y = FieldElement::from_u64(23);
        variants.push(v);
        let mut v = sample();
        v.professor = 5;
        variants.push(v);
        let mut v = sample();
        v.grade = 7;
        variants.push(v);
        let mut v = sample();
        v.major = 2;
        variants.push(v);
        for v in variants {
            assert_ne!(build_leaf(&h, &v).unwrap(), base, "{v:?}");
        }
    }

    #[test]
    fn test_swapping_professor_and_grade_changes_leaf() {
        let h = Sha256Field;
        let mut swapped = sample();
        swapped.professor = 6;
        swapped.grade = 4;
        assert_ne!(
            build_leaf(&h, &sample()).unwrap(),
            build_leaf(&h, &swapped).unwrap()
        );
    }

    #[test]
    fn test_expr_serializes_with_kind_tag() {
        let e = HashExpr::pair(
            HashExpr::input(FieldElement::from_u64(1)),
            HashExpr::input(FieldElement::from_u64(2)),
        );
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["kind"], "pair");
        assert_eq!(json["left"]["kind"], "input");
        let back: HashExpr = serde_json::from_value(json).unwrap();
        assert_eq!(back, e);
    }
}
