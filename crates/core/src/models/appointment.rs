use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::reference::{NameLookup, PartyKind, PartyRef};
use crate::validation::{FieldValidator, ValidationResult};

/// How a consultation takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ConsultationMode {
    Video,
    Chat,
}

impl ConsultationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationMode::Video => "video",
            ConsultationMode::Chat => "chat",
        }
    }
}

impl FromStr for ConsultationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ConsultationMode::Video),
            "chat" => Ok(ConsultationMode::Chat),
            other => Err(format!("unknown mode {other:?}, expected video or chat")),
        }
    }
}

/// Appointment lifecycle status.
///
/// The backend stores free-form strings, so anything outside the known set is kept
/// verbatim in `Other`. Both `cancelled` and `canceled` read as [`AppointmentStatus::Cancelled`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Other(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Other(s) => s,
        }
    }
}

impl From<String> for AppointmentStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => AppointmentStatus::Pending,
            "confirmed" => AppointmentStatus::Confirmed,
            "completed" => AppointmentStatus::Completed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            _ => AppointmentStatus::Other(s),
        }
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        match status {
            AppointmentStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AppointmentStatus::from(s.to_owned()))
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled consultation between a patient and a doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Appointment {
    pub id: i64,
    pub patient: i64,
    #[serde(rename = "patientName", default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    pub doctor: i64,
    #[serde(rename = "doctorName", default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    pub datetime: DateTime<Utc>,
    pub mode: ConsultationMode,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub status: AppointmentStatus,
}

impl Appointment {
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

/// Create or partial-update payload for an appointment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InsertAppointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl InsertAppointment {
    /// Validates a create payload; `status` defaults to `pending`.
    pub fn validate(self, id: i64) -> ValidationResult<Appointment> {
        let mut v = FieldValidator::new();
        let patient = v.required("patient", self.patient);
        let doctor = v.required("doctor", self.doctor);
        let datetime = v.required_timestamp("datetime", self.datetime);
        let mode = v
            .required("mode", self.mode)
            .and_then(|m| parse_mode(&mut v, &m));
        let status = self.status.map(AppointmentStatus::from).unwrap_or_default();

        match (patient, doctor, datetime, mode) {
            (Some(patient), Some(doctor), Some(datetime), Some(mode)) if v.is_clean() => {
                Ok(Appointment {
                    id,
                    patient,
                    patient_name: None,
                    doctor,
                    doctor_name: None,
                    datetime,
                    mode,
                    status,
                })
            }
            _ => Err(v.into_errors()),
        }
    }

    /// Merges the present fields into `current`. Joined display names are dropped because
    /// the references they describe may have changed.
    pub fn apply_patch(self, current: &Appointment) -> ValidationResult<Appointment> {
        let mut v = FieldValidator::new();
        let mut next = current.clone();
        next.patient_name = None;
        next.doctor_name = None;

        if let Some(patient) = self.patient {
            next.patient = patient;
        }
        if let Some(doctor) = self.doctor {
            next.doctor = doctor;
        }
        if let Some(raw) = self.datetime {
            if let Some(datetime) = v.timestamp("datetime", &raw) {
                next.datetime = datetime;
            }
        }
        if let Some(raw) = self.mode {
            if let Some(mode) = parse_mode(&mut v, &raw) {
                next.mode = mode;
            }
        }
        if let Some(status) = self.status {
            next.status = AppointmentStatus::from(status);
        }

        if v.is_clean() {
            Ok(next)
        } else {
            Err(v.into_errors())
        }
    }
}

fn parse_mode(v: &mut FieldValidator, raw: &str) -> Option<ConsultationMode> {
    match raw.parse() {
        Ok(mode) => Some(mode),
        Err(message) => {
            v.push("mode", message);
            None
        }
    }
}
