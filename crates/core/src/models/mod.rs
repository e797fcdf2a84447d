//! Entities served by the mock API.
//!
//! Every entity is a snapshot: it carries a server-assigned integer id and plain integer
//! foreign keys (`patient`, `doctor`). Display names (`patientName`, `doctorName`) are
//! optional extras joined at listing time and never trusted for identity.
//!
//! Each entity has an `Insert*` payload with all fields optional. The same payload type
//! validates a create (`validate`) and merges a partial update (`apply_patch`).

pub mod appointment;
pub mod feedback;
pub mod record;
pub mod reminder;
pub mod stats;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, ConsultationMode, InsertAppointment};
pub use feedback::{Feedback, InsertFeedback};
pub use record::{InsertMedicalRecord, MedicalRecord};
pub use reminder::{InsertReminder, Reminder};
pub use stats::DashboardStats;
pub use user::{InsertUser, User, UserRole};

use serde::{Deserialize, Serialize};

/// REST resources, named as they appear in API paths and cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Users,
    Appointments,
    Records,
    Reminders,
    Feedbacks,
    Stats,
}

impl Resource {
    /// Path segment under `/api/`.
    pub fn path(&self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Appointments => "appointments",
            Resource::Records => "records",
            Resource::Reminders => "reminders",
            Resource::Feedbacks => "feedbacks",
            Resource::Stats => "stats",
        }
    }

    /// Singular human label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Users => "User",
            Resource::Appointments => "Appointment",
            Resource::Records => "Medical record",
            Resource::Reminders => "Reminder",
            Resource::Feedbacks => "Feedback",
            Resource::Stats => "Stats",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}
