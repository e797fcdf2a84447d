//! Constants used throughout the telemed core crate.
//!
//! Page sizes, export naming and the field lists the export serializer applies
//! live here so the API, the client and the CLI agree on them.

/// Page size of the appointments list.
pub const APPOINTMENTS_PAGE_SIZE: usize = 10;

/// Page size of the medical records list.
pub const RECORDS_PAGE_SIZE: usize = 10;

/// Page size of the reminders list.
pub const REMINDERS_PAGE_SIZE: usize = 10;

/// Page size of the feedback list.
pub const FEEDBACK_PAGE_SIZE: usize = 8;

/// Page size of the patient and doctor directories.
pub const USERS_PAGE_SIZE: usize = 10;

/// Sentinel accepted by every category filter to mean "no filtering".
pub const ALL_SENTINEL: &str = "all";

/// Default prefix of exported file names.
pub const DEFAULT_EXPORT_PREFIX: &str = "telemed";

/// Keys never written as CSV columns, whatever the dataset.
pub const CSV_EXCLUDED_FIELDS: [&str; 5] = ["password", "id", "__v", "createdAt", "updatedAt"];

/// Keys stripped from every record before JSON export.
pub const SANITIZED_FIELDS: [&str; 1] = ["password"];

/// A medical record counts as recent when created within this many days.
pub const RECENT_RECORD_WINDOW_DAYS: i64 = 30;

/// Diagnosis or treatment terms (lowercase) that flag a medical record as critical.
pub const CRITICAL_RECORD_KEYWORDS: [&str; 10] = [
    "critical",
    "critique",
    "urgent",
    "urgence",
    "severe",
    "sévère",
    "grave",
    "acute",
    "aigu",
    "infarctus",
];

/// A patient counts as active when last seen within this many days.
pub const ACTIVE_PATIENT_WINDOW_DAYS: i64 = 30;

/// Specialties attached to doctors in directory listings.
pub const DOCTOR_SPECIALTIES: [&str; 5] = [
    "Cardiology",
    "Dermatology",
    "Neurology",
    "Pediatrics",
    "General",
];
