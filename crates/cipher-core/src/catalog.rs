//! # Lookup Catalog
//!
//! Immutable name → code tables for professors, letter grades and course
//! numbers. A catalog is explicit configuration handed to the index packer
//! and leaf builder, so different schools or semesters can use different
//! tables side by side.
//!
//! - Professor code = position in the professor list.
//! - Grade code = position in the grade list, ascending (`F` = 0).
//! - Course index = fixed value from the course map, bounded by the
//!   packed-index course budget.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::index::{field_max, COURSE_BITS};

const DEFAULT_PROFESSORS: [&str; 8] = [
    "Dr. Alice Smith",
    "Dr. Bob Johnson",
    "Dr. Carol Williams",
    "Dr. David Brown",
    "Dr. Emma Davis",
    "Dr. Frank Miller",
    "Dr. Grace Wilson",
    "Dr. Henry Moore",
];

const DEFAULT_GRADES: [&str; 10] = ["F", "D", "C-", "C", "C+", "B-", "B", "B+", "A-", "A"];

const DEFAULT_COURSES: [(&str, u64); 7] = [
    ("101", 0),
    ("102", 1),
    ("201", 2),
    ("202", 3),
    ("301", 4),
    ("302", 5),
    ("595", 6),
];

/// Serialized form of a catalog. Missing sections fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSpec {
    /// Professor names; code is the list position.
    pub professors: Vec<String>,
    /// Letter grades in ascending order; code is the list position.
    pub grades: Vec<String>,
    /// Course number → course index.
    pub courses: BTreeMap<String, u64>,
}

impl Default for CatalogSpec {
    fn default() -> Self {
        Self {
            professors: DEFAULT_PROFESSORS.iter().map(|s| s.to_string()).collect(),
            grades: DEFAULT_GRADES.iter().map(|s| s.to_string()).collect(),
            courses: DEFAULT_COURSES
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

/// Validated lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogSpec", into = "CatalogSpec")]
pub struct Catalog {
    spec: CatalogSpec,
    professor_codes: HashMap<String, u64>,
    grade_codes: HashMap<String, u64>,
}

impl Catalog {
    /// Validate and index a catalog specification.
    pub fn new(spec: CatalogSpec) -> Result<Self, ConfigError> {
        let professor_codes = positional_codes("professor", &spec.professors)?;
        let grade_codes = positional_codes("grade", &spec.grades)?;
        let max_course = field_max(COURSE_BITS);
        for (number, idx) in &spec.courses {
            if *idx > max_course {
                return Err(ConfigError::FieldOverflow {
                    field: "course",
                    value: *idx,
                    bits: COURSE_BITS,
                    max: max_course,
                });
            }
            if spec
                .courses
                .iter()
                .any(|(other, other_idx)| other != number && other_idx == idx)
            {
                return Err(ConfigError::InvalidCatalog(format!(
                    "course index {idx} assigned to more than one course number"
                )));
            }
        }
        Ok(Self {
            spec,
            professor_codes,
            grade_codes,
        })
    }

    /// Code of a professor by exact name.
    pub fn professor_code(&self, name: &str) -> Result<u64, ConfigError> {
        self.professor_codes
            .get(name)
            .copied()
            .ok_or_else(|| ConfigError::UnknownProfessor(name.to_string()))
    }

    /// Code of a letter grade.
    pub fn grade_code(&self, grade: &str) -> Result<u64, ConfigError> {
        self.grade_codes
            .get(grade)
            .copied()
            .ok_or_else(|| ConfigError::UnknownGrade(grade.to_string()))
    }

    /// Fixed index of a course number.
    pub fn course_index(&self, number: &str) -> Result<u64, ConfigError> {
        self.spec
            .courses
            .get(number)
            .copied()
            .ok_or_else(|| ConfigError::UnknownCourse(number.to_string()))
    }

    /// The underlying specification.
    pub fn spec(&self) -> &CatalogSpec {
        &self.spec
    }
}

impl Default for Catalog {
    fn default() -> Self {
        let spec = CatalogSpec::default();
        let professor_codes = spec
            .professors
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i as u64))
            .collect();
        let grade_codes = spec
            .grades
            .iter()
            .enumerate()
            .map(|(i, g)| (g.clone(), i as u64))
            .collect();
        Self {
            spec,
            professor_codes,
            grade_codes,
        }
    }
}

impl TryFrom<CatalogSpec> for Catalog {
    type Error = ConfigError;

    fn try_from(spec: CatalogSpec) -> Result<Self, Self::Error> {
        Self::new(spec)
    }
}

impl From<Catalog> for CatalogSpec {
    fn from(catalog: Catalog) -> Self {
        catalog.spec
    }
}

fn positional_codes(kind: &str, names: &[String]) -> Result<HashMap<String, u64>, ConfigError> {
    let mut codes = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if codes.insert(name.clone(), i as u64).is_some() {
            return Err(ConfigError::InvalidCatalog(format!(
                "duplicate {kind} entry {name:?}"
            )));
        }
    }
    Ok(codes)
}
