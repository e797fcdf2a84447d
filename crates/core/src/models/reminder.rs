use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reference::{NameLookup, PartyKind, PartyRef};
use crate::validation::{FieldValidator, ValidationResult};

/// A message delivered to a patient at a given time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Reminder {
    pub id: i64,
    pub patient: i64,
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub message: String,
    pub date_time: DateTime<Utc>,
    /// Delivery status reported by the messaging side (`sent`, `read`), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Reminder {
    pub fn patient_ref<'a, L: NameLookup + ?Sized>(&'a self, lookup: &'a L) -> PartyRef<'a> {
        PartyRef::resolve(
            PartyKind::Patient,
            self.patient,
            self.patient_name.as_deref(),
            lookup,
        )
    }

    pub fn is_sent(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("sent"))
    }
}

/// Create or partial-update payload for a reminder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InsertReminder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl InsertReminder {
    pub fn validate(self, id: i64) -> ValidationResult<Reminder> {
        let mut v = FieldValidator::new();
        let patient = v.required("patient", self.patient);
        let message = v.required_text("message", self.message);
        let date_time = v.required_timestamp("date_time", self.date_time);
        let status = normalise_status(self.status);

        match (patient, message, date_time) {
            (Some(patient), Some(message), Some(date_time)) if v.is_clean() => Ok(Reminder {
                id,
                patient,
                patient_name: None,
                message,
                date_time,
                status,
            }),
            _ => Err(v.into_errors()),
        }
    }

    pub fn apply_patch(self, current: &Reminder) -> ValidationResult<Reminder> {
        let mut v = FieldValidator::new();
        let mut next = current.clone();
        next.patient_name = None;

        if let Some(patient) = self.patient {
            next.patient = patient;
        }
        if let Some(message) = self.message {
            if let Some(message) = v.text("message", message) {
                next.message = message;
            }
        }
        if let Some(raw) = self.date_time {
            if let Some(date_time) = v.timestamp("date_time", &raw) {
                next.date_time = date_time;
            }
        }
        if self.status.is_some() {
            next.status = normalise_status(self.status);
        }

        if v.is_clean() {
            Ok(next)
        } else {
            Err(v.into_errors())
        }
    }
}

fn normalise_status(status: Option<String>) -> Option<String> {
    status
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
}
