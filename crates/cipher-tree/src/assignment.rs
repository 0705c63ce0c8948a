//! # Index Assignment
//!
//! The hierarchical indices that feed the packer: college, department
//! within college, major within college, and the occupant slot within each
//! `(college, department, course)` group.
//!
//! Colleges, departments, majors and slots are numbered by first
//! appearance in the enrollment snapshot. [`IndexAssignment::discover`]
//! performs that scan once, in input order, and produces an immutable
//! mapping. Everything downstream ([`IndexAssignment::locate`], the tree
//! builder, the proof extractor) is a pure lookup against it. The mapping
//! serializes to JSON so a proof can be extracted later against exactly
//! the numbering the tree was built with.
//!
//! An occupant is the tuple `(public key, professor, grade, major)`, with
//! the key taken as its recombined point. Rows repeating an occupant in the
//! same group share its slot, whichever credential schema they use.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use cipher_core::index::{check_field, COLLEGE_BITS, DEPARTMENT_BITS, SLOT_BITS};
use cipher_core::{
    Catalog, CipherError, ConfigError, EncodingError, EnrollmentRecord, FieldElement,
    IndexCoordinates, PackedIndex,
};

/// Identity of a slot holder within a course group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Occupant {
    /// Public key x coordinate.
    pub pk_x: FieldElement,
    /// Public key y coordinate.
    pub pk_y: FieldElement,
    /// Professor name.
    pub professor: String,
    /// Letter grade.
    pub grade: String,
    /// Major name.
    pub major: String,
}

impl Occupant {
    /// The occupant described by a record.
    pub fn of(record: &EnrollmentRecord) -> Result<Self, EncodingError> {
        let (pk_x, pk_y) = record.credential.point()?;
        Ok(Self {
            pk_x,
            pk_y,
            professor: record.professor.clone(),
            grade: record.grade.clone(),
            major: record.major.clone(),
        })
    }
}

/// Indices local to one college.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollegeAssignment {
    /// College index.
    pub index: u64,
    /// Department name → index.
    #[serde(default)]
    pub departments: BTreeMap<String, u64>,
    /// Major name → code.
    #[serde(default)]
    pub majors: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SlotKey {
    college: String,
    department: String,
    course: u64,
    occupant: Occupant,
}

/// Where a record lands in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// The four coordinates.
    pub coordinates: IndexCoordinates,
    /// Packed leaf position.
    pub index: PackedIndex,
    /// Major code committed into the leaf.
    pub major: u64,
}

/// Immutable college/department/major/slot numbering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AssignmentRepr", into = "AssignmentRepr")]
pub struct IndexAssignment {
    colleges: BTreeMap<String, CollegeAssignment>,
    slots: BTreeMap<SlotKey, u64>,
}

impl IndexAssignment {
    /// Number records by first appearance, in input order.
    ///
    /// Fails on the first record with an unknown catalog key, an
    /// unencodable credential, or an index outside its bit budget.
    pub fn discover(records: &[EnrollmentRecord], catalog: &Catalog) -> Result<Self, CipherError> {
        let mut assignment = Self::default();
        let mut group_sizes: BTreeMap<(String, String, u64), u64> = BTreeMap::new();

        for record in records {
            catalog.professor_code(&record.professor)?;
            catalog.grade_code(&record.grade)?;
            let course = catalog.course_index(&record.course_number)?;
            let occupant = Occupant::of(record)?;

            let next_college = assignment.colleges.len() as u64;
            let college = assignment
                .colleges
                .entry(record.college.clone())
                .or_insert_with(|| CollegeAssignment {
                    index: next_college,
                    ..CollegeAssignment::default()
                });
            check_field("college", college.index, COLLEGE_BITS)?;

            let next_department = college.departments.len() as u64;
            let department = *college
                .departments
                .entry(record.department.clone())
                .or_insert(next_department);
            check_field("department", department, DEPARTMENT_BITS)?;

            let next_major = college.majors.len() as u64;
            college
                .majors
                .entry(record.major.clone())
                .or_insert(next_major);

            let key = SlotKey {
                college: record.college.clone(),
                department: record.department.clone(),
                course,
                occupant,
            };
            if !assignment.slots.contains_key(&key) {
                let size = group_sizes
                    .entry((key.college.clone(), key.department.clone(), course))
                    .or_insert(0);
                check_field("slot", *size, SLOT_BITS)?;
                assignment.slots.insert(key, *size);
                *size += 1;
            }
        }

        tracing::info!(
            records = records.len(),
            colleges = assignment.colleges.len(),
            slots = assignment.slots.len(),
            "index assignment discovered"
        );
        Ok(assignment)
    }

    /// Resolve a record to its leaf location.
    pub fn locate(&self, catalog: &Catalog, record: &EnrollmentRecord) -> Result<Location, CipherError> {
        let college = self
            .colleges
            .get(&record.college)
            .ok_or_else(|| ConfigError::Unassigned(format!("college {:?}", record.college)))?;
        let department = *college.departments.get(&record.department).ok_or_else(|| {
            ConfigError::Unassigned(format!(
                "department {:?} in college {:?}",
                record.department, record.college
            ))
        })?;
        let major = *college.majors.get(&record.major).ok_or_else(|| {
            ConfigError::Unassigned(format!(
                "major {:?} in college {:?}",
                record.major, record.college
            ))
        })?;
        let course = catalog.course_index(&record.course_number)?;
        let key = SlotKey {
            college: record.college.clone(),
            department: record.department.clone(),
            course,
            occupant: Occupant::of(record)?,
        };
        let slot = *self.slots.get(&key).ok_or_else(|| {
            ConfigError::Unassigned(format!(
                "occupant in {}/{}/{}",
                record.college, record.department, record.course_number
            ))
        })?;
        let coordinates = IndexCoordinates {
            college: college.index,
            department,
            course,
            slot,
        };
        Ok(Location {
            coordinates,
            index: PackedIndex::pack(coordinates)?,
            major,
        })
    }

    /// Per-college indices by college name.
    pub fn colleges(&self) -> &BTreeMap<String, CollegeAssignment> {
        &self.colleges
    }

    /// Number of assigned slots (distinct occupants).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Read an assignment from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CipherError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write the assignment as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), CipherError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SlotEntry {
    college: String,
    department: String,
    course: u64,
    occupant: Occupant,
    slot: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AssignmentRepr {
    colleges: BTreeMap<String, CollegeAssignment>,
    slots: Vec<SlotEntry>,
}

fn ensure_unique<'a>(
    what: &str,
    scope: &str,
    values: impl IntoIterator<Item = &'a u64>,
) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for v in values {
        if !seen.insert(*v) {
            return Err(ConfigError::InvalidCatalog(format!(
                "{what} index {v} used twice in {scope}"
            )));
        }
    }
    Ok(())
}

impl TryFrom<AssignmentRepr> for IndexAssignment {
    type Error = ConfigError;

    fn try_from(repr: AssignmentRepr) -> Result<Self, Self::Error> {
        ensure_unique("college", "assignment", repr.colleges.values().map(|c| &c.index))?;
        for (name, college) in &repr.colleges {
            check_field("college", college.index, COLLEGE_BITS)?;
            for department in college.departments.values() {
                check_field("department", *department, DEPARTMENT_BITS)?;
            }
            ensure_unique("department", name, college.departments.values())?;
            ensure_unique("major", name, college.majors.values())?;
        }

        let mut slots = BTreeMap::new();
        let mut taken = BTreeSet::new();
        for entry in repr.slots {
            let college = repr.colleges.get(&entry.college).ok_or_else(|| {
                ConfigError::Unassigned(format!("slot references college {:?}", entry.college))
            })?;
            let department = college.departments.get(&entry.department).ok_or_else(|| {
                ConfigError::Unassigned(format!(
                    "slot references department {:?}",
                    entry.department
                ))
            })?;
            let packed = PackedIndex::pack(IndexCoordinates {
                college: college.index,
                department: *department,
                course: entry.course,
                slot: entry.slot,
            })?;
            if !taken.insert(packed) {
                return Err(ConfigError::InvalidCatalog(format!(
                    "slot {} in {}/{}/course {} assigned twice",
                    entry.slot, entry.college, entry.department, entry.course
                )));
            }
            let key = SlotKey {
                college: entry.college,
                department: entry.department,
                course: entry.course,
                occupant: entry.occupant,
            };
            if slots.insert(key, entry.slot).is_some() {
                return Err(ConfigError::InvalidCatalog(
                    "occupant listed twice in one course group".to_string(),
                ));
            }
        }

        Ok(Self {
            colleges: repr.colleges,
            slots,
        })
    }
}

impl From<IndexAssignment> for AssignmentRepr {
    fn from(assignment: IndexAssignment) -> Self {
        let slots = assignment
            .slots
            .into_iter()
            .map(|(key, slot)| SlotEntry {
                college: key.college,
                department: key.department,
                course: key.course,
                occupant: key.occupant,
                slot,
            })
            .collect();
        Self {
            colleges: assignment.colleges,
            slots,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record, sample_records};

    fn discovered() -> IndexAssignment {
        IndexAssignment::discover(&sample_records(), &Catalog::default()).unwrap()
    }

    #[test]
    fn first_seen_numbering() {
        let a = discovered();
        let eng = &a.colleges()["ENG"];
        let sci = &a.colleges()["SCI"];
        assert_eq!(eng.index, 0);
        assert_eq!(sci.index, 1);
        assert_eq!(eng.departments["CS"], 0);
        assert_eq!(eng.departments["EE"], 1);
        assert_eq!(sci.departments["BIO"], 0);
        assert_eq!(sci.departments["CHEM"], 1);
        assert_eq!(eng.majors["CS"], 0);
        assert_eq!(eng.majors["EE"], 1);
        assert_eq!(sci.majors["CHEM"], 1);
    }

    #[test]
    fn repeated_occupant_shares_slot() {
        let a = discovered();
        // seven rows, one exact repeat
        assert_eq!(a.slot_count(), 6);
        let rows = sample_records();
        let first = a.locate(&Catalog::default(), &rows[0]).unwrap();
        let repeat = a.locate(&Catalog::default(), &rows[5]).unwrap();
        assert_eq!(first, repeat);
    }

    #[test]
    fn locate_packs_coordinates() {
        let a = discovered();
        let catalog = Catalog::default();
        let rows = sample_records();

        let second = a.locate(&catalog, &rows[1]).unwrap();
        assert_eq!(
            second.coordinates,
            IndexCoordinates {
                college: 0,
                department: 0,
                course: 0,
                slot: 1
            }
        );
        assert_eq!(second.index.value(), 1);
        assert_eq!(second.major, 1);

        let chem = a.locate(&catalog, &rows[6]).unwrap();
        assert_eq!(chem.index.value(), 32768 + 4096 + 4 * 512);
    }

    #[test]
    fn credential_schema_does_not_split_an_occupant() {
        let coords = record("ENG", "CS", "101", 10, "Dr. Alice Smith", "A", "CS");
        let mut limbs = coords.clone();
        limbs.credential = cipher_core::Credential::limbs(
            FieldElement::ZERO,
            FieldElement::from_u64(10),
            FieldElement::ZERO,
            FieldElement::from_u64(11),
        )
        .unwrap();
        assert_eq!(coords.credential.point().unwrap(), limbs.credential.point().unwrap());

        let rows = vec![coords.clone(), limbs.clone()];
        let a = IndexAssignment::discover(&rows, &Catalog::default()).unwrap();
        assert_eq!(a.slot_count(), 1);
        let catalog = Catalog::default();
        assert_eq!(a.locate(&catalog, &coords).unwrap(), a.locate(&catalog, &limbs).unwrap());
        assert_eq!(a.locate(&catalog, &limbs).unwrap().index.value(), 0);
    }

    #[test]
    fn slots_restart_per_course_group() {
        let a = discovered();
        let rows = sample_records();
        let other_course = a.locate(&Catalog::default(), &rows[4]).unwrap();
        assert_eq!(other_course.coordinates.course, 1);
        assert_eq!(other_course.coordinates.slot, 0);
    }

    #[test]
    fn input_order_changes_numbering() {
        let mut rows = sample_records();
        rows.swap(0, 3);
        let a = IndexAssignment::discover(&rows, &Catalog::default()).unwrap();
        assert_eq!(a.colleges()["SCI"].index, 0);
        assert_eq!(a.colleges()["ENG"].index, 1);
    }

    #[test]
    fn unknown_course_fails_fast() {
        let mut rows = sample_records();
        rows.insert(1, record("ENG", "CS", "999", 1, "Dr. Alice Smith", "A", "CS"));
        let err = IndexAssignment::discover(&rows, &Catalog::default()).unwrap_err();
        assert!(matches!(
            err,
            CipherError::Config(ConfigError::UnknownCourse(ref c)) if c == "999"
        ));
    }

    #[test]
    fn unknown_professor_and_grade_fail() {
        let rows = vec![record("ENG", "CS", "101", 1, "Dr. Nobody", "A", "CS")];
        assert!(IndexAssignment::discover(&rows, &Catalog::default()).is_err());
        let rows = vec![record("ENG", "CS", "101", 1, "Dr. Alice Smith", "E", "CS")];
        assert!(IndexAssignment::discover(&rows, &Catalog::default()).is_err());
    }

    #[test]
    fn ninth_college_overflows() {
        let rows: Vec<_> = (0..9)
            .map(|i| record(&format!("C{i}"), "D", "101", i, "Dr. Alice Smith", "A", "M"))
            .collect();
        let err = IndexAssignment::discover(&rows, &Catalog::default()).unwrap_err();
        assert!(matches!(
            err,
            CipherError::Config(ConfigError::FieldOverflow {
                field: "college",
                value: 8,
                ..
            })
        ));
        assert!(IndexAssignment::discover(&rows[..8], &Catalog::default()).is_ok());
    }

    #[test]
    fn slot_budget_enforced() {
        let rows: Vec<_> = (0..513)
            .map(|i| record("ENG", "CS", "101", i * 2, "Dr. Alice Smith", "A", "CS"))
            .collect();
        let err = IndexAssignment::discover(&rows, &Catalog::default()).unwrap_err();
        assert!(matches!(
            err,
            CipherError::Config(ConfigError::FieldOverflow { field: "slot", .. })
        ));
    }

    #[test]
    fn unassigned_record_is_reported() {
        let a = discovered();
        let stranger = record("LAW", "TAX", "101", 1, "Dr. Alice Smith", "A", "TAX");
        assert!(matches!(
            a.locate(&Catalog::default(), &stranger),
            Err(CipherError::Config(ConfigError::Unassigned(_)))
        ));
        let new_occupant = record("ENG", "CS", "101", 999, "Dr. Alice Smith", "A", "CS");
        assert!(matches!(
            a.locate(&Catalog::default(), &new_occupant),
            Err(CipherError::Config(ConfigError::Unassigned(_)))
        ));
    }

    #[test]
    fn json_roundtrip_preserves_locations() {
        let a = discovered();
        let json = serde_json::to_string(&a).unwrap();
        let back: IndexAssignment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
        let catalog = Catalog::default();
        for r in sample_records() {
            assert_eq!(back.locate(&catalog, &r).unwrap(), a.locate(&catalog, &r).unwrap());
        }
    }

    #[test]
    fn duplicate_slot_in_json_rejected() {
        let a = discovered();
        let mut value = serde_json::to_value(&a).unwrap();
        let slots = value["slots"].as_array_mut().unwrap();
        // ENG/CS/101 holds slots 0 and 1; force both to 0
        for s in slots.iter_mut() {
            if s["college"] == "ENG" && s["department"] == "CS" && s["course"] == 0 {
                s["slot"] = serde_json::json!(0);
            }
        }
        assert!(serde_json::from_value::<IndexAssignment>(value).is_err());
    }

    #[test]
    fn out_of_budget_json_rejected() {
        let json = r#"{"colleges":{"ENG":{"index":8}},"slots":[]}"#;
        assert!(serde_json::from_str::<IndexAssignment>(json).is_err());
        let json = r#"{"colleges":{"A":{"index":0},"B":{"index":0}},"slots":[]}"#;
        assert!(serde_json::from_str::<IndexAssignment>(json).is_err());
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assignment.json");
        let a = discovered();
        a.save(&path).unwrap();
        assert_eq!(IndexAssignment::load(&path).unwrap(), a);
    }
}
