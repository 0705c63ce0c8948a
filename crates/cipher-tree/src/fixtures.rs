//! Shared enrollment rows for unit tests.

use cipher_core::{Credential, EnrollmentRecord, FieldElement};

pub(crate) fn record(
    college: &str,
    department: &str,
    course: &str,
    key: u64,
    professor: &str,
    grade: &str,
    major: &str,
) -> EnrollmentRecord {
    EnrollmentRecord {
        college: college.to_string(),
        department: department.to_string(),
        course_number: course.to_string(),
        credential: Credential::coordinates(
            FieldElement::from_u64(key),
            FieldElement::from_u64(key + 1),
        ),
        professor: professor.to_string(),
        grade: grade.to_string(),
        major: major.to_string(),
    }
}

/// Two colleges, three departments, one repeated row.
pub(crate) fn sample_records() -> Vec<EnrollmentRecord> {
    vec![
        record("ENG", "CS", "101", 10, "Dr. Alice Smith", "A", "CS"),
        record("ENG", "CS", "101", 20, "Dr. Bob Johnson", "B+", "EE"),
        record("ENG", "EE", "201", 30, "Dr. Carol Williams", "C", "EE"),
        record("SCI", "BIO", "301", 40, "Dr. David Brown", "A-", "BIO"),
        record("ENG", "CS", "102", 10, "Dr. Alice Smith", "B", "CS"),
        record("ENG", "CS", "101", 10, "Dr. Alice Smith", "A", "CS"),
        record("SCI", "CHEM", "301", 50, "Dr. Emma Davis", "F", "CHEM"),
    ]
}
