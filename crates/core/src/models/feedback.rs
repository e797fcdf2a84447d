use serde::{Deserialize, Serialize};

use crate::reference::{NameLookup, PartyKind, PartyRef};
use crate::validation::{FieldValidator, ValidationResult};

/// A patient's rating of a doctor. Ratings are expected in 1..=5 but not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Feedback {
    pub id: i64,
    pub patient: i64,
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub doctor: i64,
    #[serde(rename = "doctorName", default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    pub rating: i32,
    pub comment: String,
}

impl Feedback {
    pub fn patient_ref<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> PartyRef<'a> {
        PartyRef::resolve(
            PartyKind::Patient,
            self.patient,
            self.patient_name.as_deref(),
            lookup,
        )
    }

    pub fn doctor_ref<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> PartyRef<'a> {
        PartyRef::resolve(
            PartyKind::Doctor,
            self.doctor,
            self.doctor_name.as_deref(),
            lookup,
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InsertFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl InsertFeedback {
    pub fn validate(self, id: i64) -> ValidationResult<Feedback> {
        let mut v = FieldValidator::new();
        let patient = v.required("patient", self.patient);
        let doctor = v.required("doctor", self.doctor);
        let rating = v.required("rating", self.rating);
        let comment = v.required_text("comment", self.comment);

        match (patient, doctor, rating, comment) {
            (Some(patient), Some(doctor), Some(rating), Some(comment)) if v.is_clean() => {
                Ok(Feedback {
                    id,
                    patient,
                    patient_name: None,
                    doctor,
                    doctor_name: None,
                    rating,
                    comment,
                })
            }
            _ => Err(v.into_errors()),
        }
    }
}
