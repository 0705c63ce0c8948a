//! # Enrollment Records
//!
//! One row of the finalized enrollment snapshot: where the student sat
//! (college, department, course), their public credential, and the review
//! metadata committed into the leaf (professor, grade, major).
//!
//! Credentials come in two schemas. Early snapshots carry full public-key
//! coordinates; later ones split each coordinate into 128-bit high/low
//! limbs. Both reduce to the same `(x, y)` pair before hashing.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::error::EncodingError;
use crate::field::FieldElement;

/// A student's public credential.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Credential {
    /// Coordinates split into 128-bit limbs.
    Limbs {
        /// High 128 bits of x.
        pk_x_hi: FieldElement,
        /// Low 128 bits of x.
        pk_x_lo: FieldElement,
        /// High 128 bits of y.
        pk_y_hi: FieldElement,
        /// Low 128 bits of y.
        pk_y_lo: FieldElement,
    },
    /// Full public-key coordinates.
    Coordinates {
        /// x coordinate.
        pk_x: FieldElement,
        /// y coordinate.
        pk_y: FieldElement,
    },
}

impl Credential {
    /// Credential from full coordinates.
    pub fn coordinates(pk_x: FieldElement, pk_y: FieldElement) -> Self {
        Self::Coordinates { pk_x, pk_y }
    }

    /// Credential from limb pairs; fails if any limb exceeds 128 bits or a
    /// recombined coordinate leaves the field.
    pub fn limbs(
        pk_x_hi: FieldElement,
        pk_x_lo: FieldElement,
        pk_y_hi: FieldElement,
        pk_y_lo: FieldElement,
    ) -> Result<Self, EncodingError> {
        let credential = Self::Limbs {
            pk_x_hi,
            pk_x_lo,
            pk_y_hi,
            pk_y_lo,
        };
        credential.point()?;
        Ok(credential)
    }

    /// The `(x, y)` pair committed into the leaf.
    pub fn point(&self) -> Result<(FieldElement, FieldElement), EncodingError> {
        match self {
            Self::Coordinates { pk_x, pk_y } => Ok((*pk_x, *pk_y)),
            Self::Limbs {
                pk_x_hi,
                pk_x_lo,
                pk_y_hi,
                pk_y_lo,
            } => Ok((
                recombine(("pk_x_hi", pk_x_hi), ("pk_x_lo", pk_x_lo))?,
                recombine(("pk_y_hi", pk_y_hi), ("pk_y_lo", pk_y_lo))?,
            )),
        }
    }
}

fn recombine(
    hi: (&'static str, &FieldElement),
    lo: (&'static str, &FieldElement),
) -> Result<FieldElement, EncodingError> {
    for (name, limb) in [hi, lo] {
        if limb.bits() > 128 {
            return Err(EncodingError::LimbOverflow {
                name,
                value: limb.to_hex(),
            });
        }
    }
    let value: BigUint = (hi.1.to_biguint() << 128u32) | lo.1.to_biguint();
    FieldElement::from_biguint(&value)
}

/// One enrollment row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    /// College name.
    pub college: String,
    /// Department name within the college.
    pub department: String,
    /// Course number as listed in the catalog.
    pub course_number: String,
    /// Public credential.
    #[serde(flatten)]
    pub credential: Credential,
    /// Professor name.
    pub professor: String,
    /// Letter grade.
    pub grade: String,
    /// Major name; coded per college.
    pub major: String,
}
