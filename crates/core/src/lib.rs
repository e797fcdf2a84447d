//! # Telemed Core
//!
//! Core business logic for the telemedicine administration system.
//!
//! This crate contains pure data operations over in-memory collections:
//! - Entities and their create/patch payload validation
//! - Display-name resolution for patient and doctor references
//! - Search, category filters, date ranges, sorting and pagination
//! - Report generation and CSV/JSON export
//! - The in-memory store and its sample dataset
//!
//! **No API concerns**: HTTP servers, clients and the command line belong in `api-rest`,
//! `telemed-client` and `telemed-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod filter;
pub mod models;
pub mod reference;
pub mod report;
pub mod sample;
pub mod store;
pub mod validation;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use export::{ExportError, ExportFile, ExportFormat, ExportOptions, ExportResult, Exporter};
pub use filter::{DateRange, Page, Selection};
pub use models::{
    Appointment, AppointmentStatus, ConsultationMode, DashboardStats, Feedback, InsertAppointment,
    InsertFeedback, InsertMedicalRecord, InsertReminder, InsertUser, MedicalRecord, Reminder,
    Resource, User, UserRole,
};
pub use reference::{Directory, NameLookup, NoLookup, PartyKind, PartyRef};
pub use report::{Dataset, DatasetKind, Report, ReportType};
pub use store::Store;
pub use validation::{FieldError, ValidationErrors};
