//! # Packed Leaf Index
//!
//! Maps the hierarchical coordinates of an enrollment slot to a single leaf
//! position. Sub-fields are packed most-significant first:
//!
//! | Field | Bits | Multiplier |
//! |---|---|---|
//! | college | 3 | 2^15 |
//! | department (within college) | 3 | 2^12 |
//! | course (fixed catalog) | 3 | 2^9 |
//! | occupant slot | 9 | 1 |
//!
//! `index = college*2^15 + dept*2^12 + course*2^9 + slot`, always `< 2^18`.
//! Packing is a pure function; any sub-field outside its budget is a fatal
//! configuration error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Bit width of the college sub-field.
pub const COLLEGE_BITS: u32 = 3;
/// Bit width of the department sub-field.
pub const DEPARTMENT_BITS: u32 = 3;
/// Bit width of the course sub-field.
pub const COURSE_BITS: u32 = 3;
/// Bit width of the occupant slot sub-field.
pub const SLOT_BITS: u32 = 9;

/// Total bits consumed by a packed index; the minimum tree depth.
pub const INDEX_BITS: u32 = COLLEGE_BITS + DEPARTMENT_BITS + COURSE_BITS + SLOT_BITS;

const COURSE_SHIFT: u32 = SLOT_BITS;
const DEPARTMENT_SHIFT: u32 = COURSE_SHIFT + COURSE_BITS;
const COLLEGE_SHIFT: u32 = DEPARTMENT_SHIFT + DEPARTMENT_BITS;

/// Largest permitted value of a sub-field with the given width.
pub const fn field_max(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// The four hierarchical coordinates of a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct IndexCoordinates {
    /// College index, first-seen order.
    pub college: u64,
    /// Department index within the college.
    pub department: u64,
    /// Course index from the fixed catalog.
    pub course: u64,
    /// Occupant slot within (college, department, course).
    pub slot: u64,
}

/// A packed leaf position in `[0, 2^INDEX_BITS)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackedIndex(u64);

impl PackedIndex {
    /// Pack coordinates, checking every sub-field against its budget.
    pub fn pack(coords: IndexCoordinates) -> Result<Self, ConfigError> {
        check_field("college", coords.college, COLLEGE_BITS)?;
        check_field("department", coords.department, DEPARTMENT_BITS)?;
        check_field("course", coords.course, COURSE_BITS)?;
        check_field("slot", coords.slot, SLOT_BITS)?;
        Ok(Self(
            (coords.college << COLLEGE_SHIFT)
                | (coords.department << DEPARTMENT_SHIFT)
                | (coords.course << COURSE_SHIFT)
                | coords.slot,
        ))
    }

    /// Wrap a raw position, rejecting anything outside the packed range.
    pub fn from_raw(value: u64) -> Result<Self, ConfigError> {
        check_field("packed index", value, INDEX_BITS)?;
        Ok(Self(value))
    }

    /// Split back into coordinates.
    pub fn unpack(self) -> IndexCoordinates {
        IndexCoordinates {
            college: (self.0 >> COLLEGE_SHIFT) & field_max(COLLEGE_BITS),
            department: (self.0 >> DEPARTMENT_SHIFT) & field_max(DEPARTMENT_BITS),
            course: (self.0 >> COURSE_SHIFT) & field_max(COURSE_BITS),
            slot: self.0 & field_max(SLOT_BITS),
        }
    }

    /// The raw leaf position.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PackedIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fail unless a tree of `depth` levels can address every packed index.
pub fn ensure_depth(depth: u32) -> Result<(), ConfigError> {
    if depth < INDEX_BITS {
        return Err(ConfigError::DepthTooSmall {
            depth,
            required: INDEX_BITS,
        });
    }
    Ok(())
}

/// Fail unless `value` fits a sub-field of `bits` bits.
pub fn check_field(field: &'static str, value: u64, bits: u32) -> Result<(), ConfigError> {
    let max = field_max(bits);
    if value > max {
        return Err(ConfigError::FieldOverflow {
            field,
            value,
            bits,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(college: u64, department: u64, course: u64, slot: u64) -> IndexCoordinates {
        IndexCoordinates {
            college,
            department,
            course,
            slot,
        }
    }

    #[test]
    fn multipliers_match_layout() {
        assert_eq!(PackedIndex::pack(coords(1, 0, 0, 0)).unwrap().value(), 32768);
        assert_eq!(PackedIndex::pack(coords(0, 1, 0, 0)).unwrap().value(), 4096);
        assert_eq!(PackedIndex::pack(coords(0, 0, 1, 0)).unwrap().value(), 512);
        assert_eq!(PackedIndex::pack(coords(0, 0, 0, 1)).unwrap().value(), 1);
    }

    #[test]
    fn formula_holds() {
        let idx = PackedIndex::pack(coords(2, 3, 4, 17)).unwrap();
        assert_eq!(idx.value(), 2 * 32768 + 3 * 4096 + 4 * 512 + 17);
    }

    #[test]
    fn maximum_index_fits_depth() {
        let idx = PackedIndex::pack(coords(7, 7, 7, 511)).unwrap();
        assert_eq!(idx.value(), (1 << 18) - 1);
        assert_eq!(INDEX_BITS, 18);
    }

    #[test]
    fn overflow_names_field() {
        let err = PackedIndex::pack(coords(0, 0, 8, 0)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::FieldOverflow {
                field: "course",
                value: 8,
                bits: 3,
                max: 7
            }
        );
        let err = PackedIndex::pack(coords(0, 0, 0, 512)).unwrap_err();
        assert!(matches!(err, ConfigError::FieldOverflow { field: "slot", .. }));
    }

    #[test]
    fn depth_check() {
        assert!(ensure_depth(18).is_ok());
        assert!(ensure_depth(20).is_ok());
        assert_eq!(
            ensure_depth(17),
            Err(ConfigError::DepthTooSmall {
                depth: 17,
                required: 18
            })
        );
    }

    #[test]
    fn from_raw_bounds() {
        assert!(PackedIndex::from_raw((1 << 18) - 1).is_ok());
        assert!(PackedIndex::from_raw(1 << 18).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Unpacking recovers the coordinates that were packed.
        #[test]
        fn unpack_inverts_pack(
            college in 0u64..8,
            department in 0u64..8,
            course in 0u64..8,
            slot in 0u64..512,
        ) {
            let c = IndexCoordinates { college, department, course, slot };
            let packed = PackedIndex::pack(c).unwrap();
            prop_assert!(packed.value() < 1 << INDEX_BITS);
            prop_assert_eq!(packed.unpack(), c);
        }

        /// Packing preserves lexicographic order of coordinates.
        #[test]
        fn packing_is_monotone(
            a in (0u64..8, 0u64..8, 0u64..8, 0u64..512),
            b in (0u64..8, 0u64..8, 0u64..8, 0u64..512),
        ) {
            let ca = IndexCoordinates { college: a.0, department: a.1, course: a.2, slot: a.3 };
            let cb = IndexCoordinates { college: b.0, department: b.1, course: b.2, slot: b.3 };
            let pa = PackedIndex::pack(ca).unwrap();
            let pb = PackedIndex::pack(cb).unwrap();
            prop_assert_eq!(ca.cmp(&cb), pa.cmp(&pb));
        }
    }
}
