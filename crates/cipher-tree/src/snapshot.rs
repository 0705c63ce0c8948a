//! # Enrollment Snapshot
//!
//! Reads the finalized enrollment CSV. Required columns are `college`,
//! `department`, `course_number`, `professor`, `grade` and `major`, plus
//! either `pk_x`/`pk_y` or the four limb columns
//! `pk_x_hi`/`pk_x_lo`/`pk_y_hi`/`pk_y_lo`. Rows keep file order, which
//! determines first-seen index assignment.

use std::io;
use std::path::Path;

use serde::Deserialize;

use cipher_core::{CipherError, Credential, EncodingError, EnrollmentRecord, FieldElement};

#[derive(Debug, Deserialize)]
struct Row {
    college: String,
    department: String,
    course_number: String,
    #[serde(default)]
    pk_x: Option<String>,
    #[serde(default)]
    pk_y: Option<String>,
    #[serde(default)]
    pk_x_hi: Option<String>,
    #[serde(default)]
    pk_x_lo: Option<String>,
    #[serde(default)]
    pk_y_hi: Option<String>,
    #[serde(default)]
    pk_y_lo: Option<String>,
    professor: String,
    grade: String,
    major: String,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required(name: &'static str, value: &Option<String>) -> Result<FieldElement, EncodingError> {
    let text = present(value).ok_or(EncodingError::MissingField(name))?;
    FieldElement::parse(text)
}

impl Row {
    fn credential(&self) -> Result<Credential, EncodingError> {
        if present(&self.pk_x).is_some() || present(&self.pk_y).is_some() {
            return Ok(Credential::coordinates(
                required("pk_x", &self.pk_x)?,
                required("pk_y", &self.pk_y)?,
            ));
        }
        Credential::limbs(
            required("pk_x_hi", &self.pk_x_hi)?,
            required("pk_x_lo", &self.pk_x_lo)?,
            required("pk_y_hi", &self.pk_y_hi)?,
            required("pk_y_lo", &self.pk_y_lo)?,
        )
    }

    fn into_record(self) -> Result<EnrollmentRecord, EncodingError> {
        for (name, value) in [
            ("college", &self.college),
            ("department", &self.department),
            ("course_number", &self.course_number),
        ] {
            if value.trim().is_empty() {
                return Err(EncodingError::MissingField(name));
            }
        }
        let credential = self.credential()?;
        Ok(EnrollmentRecord {
            college: self.college,
            department: self.department,
            course_number: self.course_number,
            credential,
            professor: self.professor,
            grade: self.grade,
            major: self.major,
        })
    }
}

/// Parse snapshot rows from any reader, in file order.
pub fn read_snapshot<R: io::Read>(reader: R) -> Result<Vec<EnrollmentRecord>, CipherError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();
    for (i, row) in csv.deserialize::<Row>().enumerate() {
        // header is line 1
        let line = i + 2;
        let row = row.map_err(|e| CipherError::Serialization(format!("snapshot line {line}: {e}")))?;
        let record = row.into_record().map_err(|e| {
            tracing::error!(line, error = %e, "rejecting snapshot row");
            CipherError::Encoding(e)
        })?;
        records.push(record);
    }
    tracing::debug!(rows = records.len(), "snapshot read");
    Ok(records)
}

/// Read a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Vec<EnrollmentRecord>, CipherError> {
    let file = std::fs::File::open(path)?;
    read_snapshot(io::BufReader::new(file))
}

/// Field-by-field row selector; unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    /// College name.
    pub college: Option<String>,
    /// Department name.
    pub department: Option<String>,
    /// Course number.
    pub course_number: Option<String>,
    /// Professor name.
    pub professor: Option<String>,
    /// Letter grade.
    pub grade: Option<String>,
    /// Major name.
    pub major: Option<String>,
    /// Recombined public key x coordinate.
    pub pk_x: Option<FieldElement>,
}

impl RecordFilter {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether a record satisfies every set field.
    pub fn matches(&self, record: &EnrollmentRecord) -> bool {
        fn eq(want: &Option<String>, have: &str) -> bool {
            want.as_deref().map_or(true, |w| w == have)
        }
        eq(&self.college, &record.college)
            && eq(&self.department, &record.department)
            && eq(&self.course_number, &record.course_number)
            && eq(&self.professor, &record.professor)
            && eq(&self.grade, &record.grade)
            && eq(&self.major, &record.major)
            && self.pk_x.map_or(true, |x| {
                record
                    .credential
                    .point()
                    .map(|(px, _)| px == x)
                    .unwrap_or(false)
            })
    }

    /// Position of the first matching record.
    pub fn find(&self, records: &[EnrollmentRecord]) -> Option<usize> {
        records.iter().position(|r| self.matches(r))
    }
}
