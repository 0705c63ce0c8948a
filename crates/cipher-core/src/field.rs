//! # Field Elements — Canonical 32-Byte Encoding
//!
//! Every leaf, internal node, sibling and root in the commitment tree is a
//! `FieldElement`: an integer strictly below the BN254 scalar modulus,
//! stored as a fixed 32-byte big-endian array.
//!
//! ## Security Invariant
//!
//! The inner bytes are private and every constructor checks the modulus
//! bound, so a `FieldElement` is always canonical. Two equal integers can
//! never have different encodings, which keeps node storage and proof
//! comparison byte-exact.
//!
//! ## Text Form
//!
//! `0x` followed by 64 lowercase hex digits. Parsing also accepts shorter
//! hex and plain decimal, matching how enrollment snapshots spell numbers.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EncodingError;

/// Width of the canonical encoding in bytes.
pub const FIELD_BYTES: usize = 32;

/// BN254 scalar field modulus, big-endian.
///
/// `0x30644e72e131a029b85045b68181585d2833e84879b9709143e1f593f0000001`
pub const BN254_MODULUS_BE: [u8; FIELD_BYTES] = [
    0x30, 0x64, 0x4e, 0x72, 0xe1, 0x31, 0xa0, 0x29, 0xb8, 0x50, 0x45, 0xb6, 0x81, 0x81, 0x58, 0x5d,
    0x28, 0x33, 0xe8, 0x48, 0x79, 0xb9, 0x70, 0x91, 0x43, 0xe1, 0xf5, 0x93, 0xf0, 0x00, 0x00, 0x01,
];

/// Public sentinel used as the default leaf of every tree.
pub const DEFAULT_ZERO_VALUE_HEX: &str =
    "0x18d85f3de6dcd78b6ffbf5d8374433a5528d8e3bf2100df0b7bb43a4c59ebd63";

/// A canonical element of the BN254 scalar field.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FieldElement([u8; FIELD_BYTES]);

impl FieldElement {
    /// The additive identity.
    pub const ZERO: Self = Self([0u8; FIELD_BYTES]);

    /// Build from big-endian bytes, rejecting values at or above the modulus.
    pub fn from_be_bytes(bytes: [u8; FIELD_BYTES]) -> Result<Self, EncodingError> {
        if bytes >= BN254_MODULUS_BE {
            return Err(EncodingError::OutOfField(bytes_to_hex(&bytes)));
        }
        Ok(Self(bytes))
    }

    /// Build from a small integer. Always in range.
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; FIELD_BYTES];
        bytes[FIELD_BYTES - 8..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Build from a 128-bit integer. Always in range.
    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; FIELD_BYTES];
        bytes[FIELD_BYTES - 16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Build from an arbitrary-precision integer.
    pub fn from_biguint(value: &BigUint) -> Result<Self, EncodingError> {
        let raw = value.to_bytes_be();
        if raw.len() > FIELD_BYTES {
            return Err(EncodingError::OutOfField(format!("0x{}", value.to_str_radix(16))));
        }
        let mut bytes = [0u8; FIELD_BYTES];
        bytes[FIELD_BYTES - raw.len()..].copy_from_slice(&raw);
        Self::from_be_bytes(bytes)
    }

    /// Parse `0x`-prefixed hex or decimal text.
    pub fn parse(input: &str) -> Result<Self, EncodingError> {
        Self::from_biguint(&parse_biguint(input)?)
    }

    /// Canonical big-endian bytes.
    pub fn as_bytes(&self) -> &[u8; FIELD_BYTES] {
        &self.0
    }

    /// Consume into big-endian bytes.
    pub fn to_be_bytes(self) -> [u8; FIELD_BYTES] {
        self.0
    }

    /// Arbitrary-precision view of the value.
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    /// Render as `0x` + 64 lowercase hex digits.
    pub fn to_hex(&self) -> String {
        bytes_to_hex(&self.0)
    }

    /// Render as a decimal string.
    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_str_radix(10)
    }

    /// Number of significant bits.
    pub fn bits(&self) -> u64 {
        self.to_biguint().bits()
    }
}

/// Parse decimal or `0x`-prefixed hex into an unbounded integer.
pub fn parse_biguint(input: &str) -> Result<BigUint, EncodingError> {
    let trimmed = input.trim();
    let (digits, radix) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (trimmed, 10),
    };
    let well_formed = !digits.is_empty()
        && digits.bytes().all(|b| match radix {
            16 => b.is_ascii_hexdigit(),
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(EncodingError::InvalidNumber(input.to_string()));
    }
    BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| EncodingError::InvalidNumber(input.to_string()))
}

fn bytes_to_hex(bytes: &[u8; FIELD_BYTES]) -> String {
    let mut out = String::with_capacity(2 + 2 * FIELD_BYTES);
    out.push_str("0x");
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl FromStr for FieldElement {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
