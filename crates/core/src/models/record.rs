use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::CRITICAL_RECORD_KEYWORDS;
use crate::reference::{NameLookup, PartyKind, PartyRef};
use crate::validation::{FieldValidator, ValidationResult};

/// A consultation outcome attached to a patient.
///
/// `file` only names an attachment; no binary content is modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MedicalRecord {
    pub id: i64,
    pub patient: i64,
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl MedicalRecord {
    pub fn patient_ref<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> PartyRef<'a> {
        PartyRef::resolve(
            PartyKind::Patient,
            self.patient,
            self.patient_name.as_deref(),
            lookup,
        )
    }

    /// True when the diagnosis or treatment mentions one of [`CRITICAL_RECORD_KEYWORDS`].
    pub fn is_critical(&self) -> bool {
        let text = format!("{} {}", self.diagnosis, self.treatment).to_lowercase();
        CRITICAL_RECORD_KEYWORDS.iter().any(|k| text.contains(k))
    }
}

/// Create payload for a medical record. `created_at` is assigned by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InsertMedicalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl InsertMedicalRecord {
    pub fn validate(self, id: i64, created_at: DateTime<Utc>) -> ValidationResult<MedicalRecord> {
        let mut v = FieldValidator::new();
        let patient = v.required("patient", self.patient);
        let diagnosis = v.required_text("diagnosis", self.diagnosis);
        let treatment = v.required_text("treatment", self.treatment);
        let file = self
            .file
            .map(|f| f.trim().to_owned())
            .filter(|f| !f.is_empty());

        match (patient, diagnosis, treatment) {
            (Some(patient), Some(diagnosis), Some(treatment)) if v.is_clean() => {
                Ok(MedicalRecord {
                    id,
                    patient,
                    patient_name: None,
                    created_at,
                    diagnosis,
                    treatment,
                    file,
                })
            }
            _ => Err(v.into_errors()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_validate_builds_record_without_file() {
        let now = Utc.with_ymd_and_hms(2025, 4, 10, 15, 30, 0).unwrap();
        let record = InsertMedicalRecord {
            patient: Some(1),
            diagnosis: Some("Grippe saisonnière".into()),
            treatment: Some("Repos, paracétamol, hydratation".into()),
            file: Some("  ".into()),
        }
        .validate(4, now)
        .unwrap();

        assert_eq!(record.id, 4);
        assert_eq!(record.created_at, now);
        assert_eq!(record.file, None);
    }

    #[test]
    fn test_file_serializes_as_null_when_absent() {
        let now = Utc.with_ymd_and_hms(2025, 4, 10, 15, 30, 0).unwrap();
        let record = InsertMedicalRecord {
            patient: Some(1),
            diagnosis: Some("Hypertension".into()),
            treatment: Some("Low-salt diet".into()),
            file: None,
        }
        .validate(1, now)
        .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["file"].is_null());
    }

    #[test]
    fn test_validate_rejects_blank_diagnosis() {
        let errors = InsertMedicalRecord {
            patient: Some(1),
            diagnosis: Some(" ".into()),
            treatment: Some("Rest".into()),
            file: None,
        }
        .validate(1, Utc::now())
        .unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].field, "diagnosis");
    }
}
