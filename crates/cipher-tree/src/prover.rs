//! # Prover Inputs
//!
//! The witness handed to the external proof generator for one membership
//! proof. Numbers are decimal strings and field elements `0x` hex, so the
//! same structure renders to `Prover.toml` or JSON without loss.

use serde::{Deserialize, Serialize};

use cipher_core::{CipherError, Credential, EnrollmentRecord};

use crate::extractor::MembershipProof;

/// Witness fields for one enrollment leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverInputs {
    /// Packed leaf position.
    pub leaf_index: String,
    /// Sibling path, leaf level first.
    pub path: Vec<String>,
    /// Public key x (coordinate schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_x: Option<String>,
    /// Public key y (coordinate schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_y: Option<String>,
    /// High limb of x (limb schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_x_hi: Option<String>,
    /// Low limb of x (limb schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_x_lo: Option<String>,
    /// High limb of y (limb schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_y_hi: Option<String>,
    /// Low limb of y (limb schema).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk_y_lo: Option<String>,
    /// Professor code.
    pub professor: String,
    /// Grade code.
    pub grade: String,
    /// Major code.
    pub major: String,
    /// College index.
    pub college_idx: String,
    /// Department index.
    pub dept_idx: String,
    /// Course index.
    pub course_idx: String,
    /// Tree root the path leads to.
    pub root: String,
}

impl ProverInputs {
    /// Assemble inputs from an extracted proof and the record it covers.
    ///
    /// The credential is emitted in the schema the record was read in.
    pub fn new(membership: &MembershipProof, record: &EnrollmentRecord) -> Self {
        let coords = membership.location.coordinates;
        let mut inputs = Self {
            leaf_index: membership.location.index.value().to_string(),
            path: membership.proof.siblings.iter().map(|s| s.to_hex()).collect(),
            pk_x: None,
            pk_y: None,
            pk_x_hi: None,
            pk_x_lo: None,
            pk_y_hi: None,
            pk_y_lo: None,
            professor: membership.inputs.professor.to_string(),
            grade: membership.inputs.grade.to_string(),
            major: membership.inputs.major.to_string(),
            college_idx: coords.college.to_string(),
            dept_idx: coords.department.to_string(),
            course_idx: coords.course.to_string(),
            root: membership.proof.root.to_hex(),
        };
        match &record.credential {
            Credential::Coordinates { pk_x, pk_y } => {
                inputs.pk_x = Some(pk_x.to_hex());
                inputs.pk_y = Some(pk_y.to_hex());
            }
            Credential::Limbs {
                pk_x_hi,
                pk_x_lo,
                pk_y_hi,
                pk_y_lo,
            } => {
                inputs.pk_x_hi = Some(pk_x_hi.to_hex());
                inputs.pk_x_lo = Some(pk_x_lo.to_hex());
                inputs.pk_y_hi = Some(pk_y_hi.to_hex());
                inputs.pk_y_lo = Some(pk_y_lo.to_hex());
            }
        }
        inputs
    }

    /// Render as `Prover.toml`.
    pub fn to_toml(&self) -> Result<String, CipherError> {
        toml::to_string(self).map_err(|e| CipherError::Serialization(e.to_string()))
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> Result<String, CipherError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
