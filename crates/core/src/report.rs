//! Report generation: a report type plus an optional date range applied to one dataset.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ACTIVE_PATIENT_WINDOW_DAYS, CRITICAL_RECORD_KEYWORDS, RECENT_RECORD_WINDOW_DAYS,
};
use crate::error::{CoreError, CoreResult};
use crate::export::{ExportFile, ExportFormat, ExportOptions, ExportResult, Exporter};
use crate::filter::{DateRange, Dated};
use crate::models::{Appointment, AppointmentStatus, Feedback, MedicalRecord, Reminder, User};

/// The datasets a report or export can be run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Appointments,
    Records,
    Patients,
    Reminders,
    Feedback,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 5] = [
        DatasetKind::Appointments,
        DatasetKind::Records,
        DatasetKind::Patients,
        DatasetKind::Reminders,
        DatasetKind::Feedback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Appointments => "appointments",
            DatasetKind::Records => "records",
            DatasetKind::Patients => "patients",
            DatasetKind::Reminders => "reminders",
            DatasetKind::Feedback => "feedback",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Appointments => "Appointments",
            DatasetKind::Records => "Medical records",
            DatasetKind::Patients => "Patients",
            DatasetKind::Reminders => "Reminders",
            DatasetKind::Feedback => "Feedback",
        }
    }

    /// Report types this dataset offers, `All` first.
    pub fn report_types(&self) -> &'static [ReportType] {
        match self {
            DatasetKind::Appointments => &[
                ReportType::All,
                ReportType::Upcoming,
                ReportType::Past,
                ReportType::Cancelled,
            ],
            DatasetKind::Reminders => &[
                ReportType::All,
                ReportType::Upcoming,
                ReportType::Past,
                ReportType::Sent,
            ],
            DatasetKind::Records => &[ReportType::All, ReportType::Recent, ReportType::Critical],
            DatasetKind::Patients => &[ReportType::All, ReportType::Active, ReportType::Inactive],
            DatasetKind::Feedback => &[ReportType::All],
        }
    }

    pub fn offers(&self, report_type: ReportType) -> bool {
        self.report_types().contains(&report_type)
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatasetKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "appointments" => Ok(DatasetKind::Appointments),
            "records" => Ok(DatasetKind::Records),
            "patients" => Ok(DatasetKind::Patients),
            "reminders" => Ok(DatasetKind::Reminders),
            "feedback" | "feedbacks" => Ok(DatasetKind::Feedback),
            _ => Err(CoreError::UnknownDatasetKind(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    All,
    Upcoming,
    Past,
    Cancelled,
    Sent,
    Recent,
    Critical,
    Active,
    Inactive,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::All => "all",
            ReportType::Upcoming => "upcoming",
            ReportType::Past => "past",
            ReportType::Cancelled => "cancelled",
            ReportType::Sent => "sent",
            ReportType::Recent => "recent",
            ReportType::Critical => "critical",
            ReportType::Active => "active",
            ReportType::Inactive => "inactive",
        }
    }

    /// Parses `value` and checks that `kind` offers it. Empty input means `All`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownReportType` for unknown names and for types `kind` does not offer.
    pub fn parse_for(kind: DatasetKind, value: &str) -> CoreResult<Self> {
        let unknown = || CoreError::UnknownReportType {
            kind,
            report_type: value.to_owned(),
        };
        let parsed = if value.trim().is_empty() {
            ReportType::All
        } else {
            value.parse::<ReportType>().map_err(|_| unknown())?
        };
        if kind.offers(parsed) {
            Ok(parsed)
        } else {
            Err(unknown())
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ReportType::All),
            "upcoming" => Ok(ReportType::Upcoming),
            "past" => Ok(ReportType::Past),
            "cancelled" | "canceled" => Ok(ReportType::Cancelled),
            "sent" => Ok(ReportType::Sent),
            "recent" => Ok(ReportType::Recent),
            "critical" => Ok(ReportType::Critical),
            "active" => Ok(ReportType::Active),
            "inactive" => Ok(ReportType::Inactive),
            other => Err(format!("unknown report type: {other}")),
        }
    }
}

/// Entities that can be reported on.
pub trait Reportable: Dated {
    const KIND: DatasetKind;

    /// Whether the item belongs in a report of `report_type` generated at `now`.
    /// Only called with types [`Self::KIND`] offers.
    fn report_predicate(&self, report_type: ReportType, now: DateTime<Utc>) -> bool;
}

fn timing(date: Option<DateTime<Utc>>, report_type: ReportType, now: DateTime<Utc>) -> bool {
    match report_type {
        ReportType::Upcoming => date.is_some_and(|d| d > now),
        ReportType::Past => date.is_some_and(|d| d < now),
        _ => true,
    }
}

impl Reportable for Appointment {
    const KIND: DatasetKind = DatasetKind::Appointments;

    fn report_predicate(&self, report_type: ReportType, now: DateTime<Utc>) -> bool {
        match report_type {
            ReportType::Cancelled => self.status == AppointmentStatus::Cancelled,
            other => timing(self.resolved_date(), other, now),
        }
    }
}

impl Reportable for Reminder {
    const KIND: DatasetKind = DatasetKind::Reminders;

    fn report_predicate(&self, report_type: ReportType, now: DateTime<Utc>) -> bool {
        match report_type {
            ReportType::Sent => self.is_sent(),
            other => timing(self.resolved_date(), other, now),
        }
    }
}

impl Reportable for MedicalRecord {
    const KIND: DatasetKind = DatasetKind::Records;

    fn report_predicate(&self, report_type: ReportType, now: DateTime<Utc>) -> bool {
        match report_type {
            ReportType::Recent => {
                self.created_at >= now - Duration::days(RECENT_RECORD_WINDOW_DAYS)
                    && self.created_at <= now
            }
            ReportType::Critical => self.is_critical(),
            _ => true,
        }
    }
}

impl Reportable for User {
    const KIND: DatasetKind = DatasetKind::Patients;

    fn report_predicate(&self, report_type: ReportType, now: DateTime<Utc>) -> bool {
        let active = self
            .last_appointment
            .is_some_and(|d| d >= now - Duration::days(ACTIVE_PATIENT_WINDOW_DAYS));
        match report_type {
            ReportType::Active => active,
            ReportType::Inactive => !active,
            _ => true,
        }
    }
}

impl Reportable for Feedback {
    const KIND: DatasetKind = DatasetKind::Feedback;

    fn report_predicate(&self, _report_type: ReportType, _now: DateTime<Utc>) -> bool {
        true
    }
}

/// The type predicate, then the date range, in source order.
pub fn apply_report<T: Reportable + Clone>(
    items: &[T],
    report_type: ReportType,
    range: &DateRange,
    now: DateTime<Utc>,
) -> Vec<T> {
    items
        .iter()
        .filter(|item| item.report_predicate(report_type, now) && range.admits(*item))
        .cloned()
        .collect()
}

/// A report over one dataset: source, selected type, date range and last results.
#[derive(Debug, Clone)]
pub struct Report<T> {
    source: Vec<T>,
    report_type: ReportType,
    range: DateRange,
    results: Vec<T>,
}

impl<T: Reportable + Clone> Report<T> {
    /// A fresh report whose results are the whole source.
    pub fn new(source: Vec<T>) -> Self {
        Self {
            results: source.clone(),
            source,
            report_type: ReportType::All,
            range: DateRange::default(),
        }
    }

    pub fn kind(&self) -> DatasetKind {
        T::KIND
    }

    /// # Errors
    ///
    /// Returns `CoreError::UnknownReportType` if this dataset does not offer `report_type`.
    pub fn select(&mut self, report_type: ReportType) -> CoreResult<()> {
        if !T::KIND.offers(report_type) {
            return Err(CoreError::UnknownReportType {
                kind: T::KIND,
                report_type: report_type.as_str().to_owned(),
            });
        }
        self.report_type = report_type;
        Ok(())
    }

    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
    }

    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    /// Recomputes the results against the wall clock.
    pub fn generate(&mut self) -> &[T] {
        self.generate_at(Utc::now())
    }

    pub fn generate_at(&mut self, now: DateTime<Utc>) -> &[T] {
        self.results = apply_report(&self.source, self.report_type, &self.range, now);
        &self.results
    }

    /// Back to `All`, no range, results equal to the source.
    pub fn reset(&mut self) {
        self.report_type = ReportType::All;
        self.range = DateRange::default();
        self.results = self.source.clone();
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn source(&self) -> &[T] {
        &self.source
    }

    pub fn into_results(self) -> Vec<T> {
        self.results
    }
}

/// A whole dataset of one kind, as loaded for a report or an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Dataset {
    Appointments(Vec<Appointment>),
    Records(Vec<MedicalRecord>),
    Patients(Vec<User>),
    Reminders(Vec<Reminder>),
    Feedback(Vec<Feedback>),
}

impl Dataset {
    pub fn kind(&self) -> DatasetKind {
        match self {
            Dataset::Appointments(_) => DatasetKind::Appointments,
            Dataset::Records(_) => DatasetKind::Records,
            Dataset::Patients(_) => DatasetKind::Patients,
            Dataset::Reminders(_) => DatasetKind::Reminders,
            Dataset::Feedback(_) => DatasetKind::Feedback,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Dataset::Appointments(items) => items.len(),
            Dataset::Records(items) => items.len(),
            Dataset::Patients(items) => items.len(),
            Dataset::Reminders(items) => items.len(),
            Dataset::Feedback(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Narrows the dataset to a report.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownReportType` if this kind does not offer `report_type`.
    pub fn report(
        self,
        report_type: ReportType,
        range: &DateRange,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let kind = self.kind();
        if !kind.offers(report_type) {
            return Err(CoreError::UnknownReportType {
                kind,
                report_type: report_type.as_str().to_owned(),
            });
        }
        Ok(match self {
            Dataset::Appointments(items) => {
                Dataset::Appointments(apply_report(&items, report_type, range, now))
            }
            Dataset::Records(items) => Dataset::Records(apply_report(&items, report_type, range, now)),
            Dataset::Patients(items) => Dataset::Patients(apply_report(&items, report_type, range, now)),
            Dataset::Reminders(items) => {
                Dataset::Reminders(apply_report(&items, report_type, range, now))
            }
            Dataset::Feedback(items) => Dataset::Feedback(apply_report(&items, report_type, range, now)),
        })
    }

    pub fn export(
        &self,
        exporter: &Exporter,
        format: ExportFormat,
        options: ExportOptions,
    ) -> ExportResult<ExportFile> {
        let kind = self.kind();
        match self {
            Dataset::Appointments(items) => exporter.export(kind, items, format, options),
            Dataset::Records(items) => exporter.export(kind, items, format, options),
            Dataset::Patients(items) => exporter.export(kind, items, format, options),
            Dataset::Reminders(items) => exporter.export(kind, items, format, options),
            Dataset::Feedback(items) => exporter.export(kind, items, format, options),
        }
    }
}
