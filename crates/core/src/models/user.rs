use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::DOCTOR_SPECIALTIES;
use crate::validation::{FieldValidator, ValidationResult};

/// Role selected by the `is_patient` / `is_doctor` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserRole {
    Patient,
    Doctor,
}

/// An account known to the system.
///
/// The role flags are independent booleans on the wire; the domain treats them as exclusive.
/// The fields after `name` are derived per listing (random in the mock) and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub email: String,
    #[serde(default)]
    pub is_patient: bool,
    #[serde(default)]
    pub is_doctor: bool,
    /// Display name, when the account has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(rename = "patientCount", default, skip_serializing_if = "Option::is_none")]
    pub patient_count: Option<u32>,
    #[serde(rename = "lastAppointment", default, skip_serializing_if = "Option::is_none")]
    pub last_appointment: Option<DateTime<Utc>>,
    #[serde(rename = "recordCount", default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<u32>,
}

impl User {
    pub fn has_role(&self, role: UserRole) -> bool {
        match role {
            UserRole::Patient => self.is_patient,
            UserRole::Doctor => self.is_doctor,
        }
    }

    /// Name shown in tables: the display name, else the username.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }

    /// Copy safe to hand out: no password.
    pub fn redacted(&self) -> Self {
        Self {
            password: None,
            ..self.clone()
        }
    }

    /// Attaches the role-specific listing fields.
    ///
    /// Doctors get a rating in `[3, 5)`, a specialty and a patient count in `10..60`;
    /// patients get a last appointment within the past 30 days and a record count in `0..10`.
    pub fn with_listing_details<R: Rng + ?Sized>(
        mut self,
        role: UserRole,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Self {
        match role {
            UserRole::Doctor => {
                let rating: f64 = rng.gen_range(3.0..5.0);
                self.rating = Some((rating * 10.0).floor() / 10.0);
                self.specialty = DOCTOR_SPECIALTIES.choose(rng).map(|s| s.to_string());
                self.patient_count = Some(rng.gen_range(10..60));
            }
            UserRole::Patient => {
                let days_ago = rng.gen_range(0..30);
                self.last_appointment = Some(now - Duration::days(days_ago));
                self.record_count = Some(rng.gen_range(0..10));
            }
        }
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InsertUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_patient: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_doctor: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl InsertUser {
    pub fn validate(self, id: i64) -> ValidationResult<User> {
        let mut v = FieldValidator::new();
        let username = v.required_text("username", self.username);
        let password = v.required("password", self.password);
        if password.as_deref().is_some_and(|p| p.is_empty()) {
            v.push("password", "cannot be empty");
        }
        let email = v.required_text("email", self.email);
        if email.as_deref().is_some_and(|e| !e.contains('@')) {
            v.push("email", "expected an email address");
        }
        let name = self
            .name
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());

        match (username, password, email) {
            (Some(username), Some(password), Some(email)) if v.is_clean() => Ok(User {
                id,
                username,
                password: Some(password),
                email,
                is_patient: self.is_patient.unwrap_or(false),
                is_doctor: self.is_doctor.unwrap_or(false),
                name,
                specialty: None,
                rating: None,
                patient_count: None,
                last_appointment: None,
                record_count: None,
            }),
            _ => Err(v.into_errors()),
        }
    }
}
