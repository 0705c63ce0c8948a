//! # Field Hash Primitive
//!
//! A domain-tagged two-input compression function over the BN254 scalar
//! field: `hash2(tag, left, right) -> FieldElement`. Leaves, internal nodes
//! and the zero table are all built from this one primitive.
//!
//! ## Backends
//!
//! - [`PoseidonBn254`] — circom-compatible Poseidon (`light-poseidon`).
//!   Tag `0` hashes `(left, right)` with the width-3 permutation; any other
//!   tag `t` hashes `(t, left, right)` with the width-4 permutation, so
//!   outputs of different tags live in disjoint domains.
//! - [`Sha256Field`] — `SHA256(tag_be32 || left || right) mod p`. Much
//!   faster; intended for large offline datasets and tests.
//!
//! ## Security Invariant
//!
//! Inputs and outputs are canonical `FieldElement`s. Conversion into the
//! arkworks representation never reduces (inputs are already below the
//! modulus), so distinct inputs stay distinct.

use std::fmt;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use cipher_core::field::FIELD_BYTES;
use cipher_core::{CryptoError, FieldElement, HashAlgorithm};

/// Logical separation tag passed to every hash call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DomainTag(pub u32);

impl DomainTag {
    /// The tag used for leaf construction, tree nodes and the zero table.
    pub const DEFAULT: Self = Self(0);
}

/// Two-input compression over field elements.
///
/// Implementations must be deterministic and collision resistant.
pub trait FieldHasher: Send + Sync {
    /// Identifies the primitive for persistence.
    fn algorithm(&self) -> HashAlgorithm;

    /// Hash two field elements under a domain tag.
    fn hash2(
        &self,
        tag: DomainTag,
        left: &FieldElement,
        right: &FieldElement,
    ) -> Result<FieldElement, CryptoError>;
}

impl<H: FieldHasher + ?Sized> FieldHasher for &H {
    fn algorithm(&self) -> HashAlgorithm {
        (**self).algorithm()
    }

    fn hash2(
        &self,
        tag: DomainTag,
        left: &FieldElement,
        right: &FieldElement,
    ) -> Result<FieldElement, CryptoError> {
        (**self).hash2(tag, left, right)
    }
}

fn to_fr(value: &FieldElement) -> Fr {
    Fr::from_be_bytes_mod_order(value.as_bytes())
}

fn from_fr(value: Fr) -> Result<FieldElement, CryptoError> {
    let raw = value.into_bigint().to_bytes_be();
    if raw.len() > FIELD_BYTES {
        return Err(CryptoError::HashFailed(format!(
            "field output is {} bytes",
            raw.len()
        )));
    }
    let mut bytes = [0u8; FIELD_BYTES];
    bytes[FIELD_BYTES - raw.len()..].copy_from_slice(&raw);
    Ok(FieldElement::from_be_bytes(bytes)?)
}

// ---------------------------------------------------------------------------
// Poseidon over BN254
// ---------------------------------------------------------------------------

/// Circom-compatible Poseidon hasher.
///
/// Holds one permutation instance per arity behind a lock; the sponge state
/// is reset by every `hash` call, so instances are reused across calls.
pub struct PoseidonBn254 {
    pair: Mutex<Poseidon<Fr>>,
    tagged: Mutex<Poseidon<Fr>>,
}

impl PoseidonBn254 {
    /// Build the width-3 and width-4 permutations.
    pub fn new() -> Result<Self, CryptoError> {
        let pair = Poseidon::<Fr>::new_circom(2)
            .map_err(|e| CryptoError::HashFailed(format!("poseidon init: {e}")))?;
        let tagged = Poseidon::<Fr>::new_circom(3)
            .map_err(|e| CryptoError::HashFailed(format!("poseidon init: {e}")))?;
        Ok(Self {
            pair: Mutex::new(pair),
            tagged: Mutex::new(tagged),
        })
    }
}

impl fmt::Debug for PoseidonBn254 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PoseidonBn254")
    }
}

impl FieldHasher for PoseidonBn254 {
    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::PoseidonBn254
    }

    fn hash2(
        &self,
        tag: DomainTag,
        left: &FieldElement,
        right: &FieldElement,
    ) -> Result<FieldElement, CryptoError> {
        let out = if tag == DomainTag::DEFAULT {
            self.pair.lock().hash(&[to_fr(left), to_fr(right)])
        } else {
            self.tagged
                .lock()
                .hash(&[Fr::from(u64::from(tag.0)), to_fr(left), to_fr(right)])
        };
        let out = out.map_err(|e| CryptoError::HashFailed(format!("poseidon: {e}")))?;
        from_fr(out)
    }
}

// ---------------------------------------------------------------------------
// SHA-256 reduced into the field
// ---------------------------------------------------------------------------

/// SHA-256 of `tag || left || right`, reduced modulo the BN254 prime.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Field;

impl FieldHasher for Sha256Field {
    fn algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha256
    }

    fn hash2(
        &self,
        tag: DomainTag,
        left: &FieldElement,
        right: &FieldElement,
    ) -> Result<FieldElement, CryptoError> {
        let mut hasher = Sha256::new();
        hasher.update(tag.0.to_be_bytes());
        hasher.update(left.as_bytes());
        hasher.update(right.as_bytes());
        let digest = hasher.finalize();
        from_fr(Fr::from_be_bytes_mod_order(&digest))
    }
}

// ---------------------------------------------------------------------------
// Runtime selection
// ---------------------------------------------------------------------------

/// A hasher chosen from configuration at runtime.
#[derive(Debug)]
pub enum HashBackend {
    /// Poseidon over BN254.
    Poseidon(PoseidonBn254),
    /// SHA-256 reduced into the field.
    Sha256(Sha256Field),
}

impl HashBackend {
    /// Instantiate the backend for an algorithm tag.
    pub fn from_algorithm(algorithm: HashAlgorithm) -> Result<Self, CryptoError> {
        Ok(match algorithm {
            HashAlgorithm::PoseidonBn254 => Self::Poseidon(PoseidonBn254::new()?),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256Field),
        })
    }
}

impl FieldHasher for HashBackend {
    fn algorithm(&self) -> HashAlgorithm {
        match self {
            Self::Poseidon(h) => h.algorithm(),
            Self::Sha256(h) => h.algorithm(),
        }
    }

    fn hash2(
        &self,
        tag: DomainTag,
        left: &FieldElement,
        right: &FieldElement,
    ) -> Result<FieldElement, CryptoError> {
        match self {
            Self::Poseidon(h) => h.hash2(tag, left, right),
            Self::Sha256(h) => h.hash2(tag, left, right),
        }
    }
}
