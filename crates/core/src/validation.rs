//! Input validation utilities.
//!
//! Insert payloads arrive with every field optional so that a single pass can report all
//! problems at once. [`FieldValidator`] collects those problems as [`FieldError`]s; the
//! API returns them as a structured list with HTTP 400.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single problem with one field of an input payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every field problem found in one payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_errors(self) -> Vec<FieldError> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends the errors in `other` for fields not already reported here.
    pub fn merge(mut self, other: ValidationErrors) -> Self {
        for error in other.0 {
            if !self.0.iter().any(|e| e.field == error.field) {
                self.0.push(error);
            }
        }
        self
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub type ValidationResult<T> = std::result::Result<T, ValidationErrors>;

/// Collects field errors while a payload is being checked.
#[derive(Debug, Default)]
pub struct FieldValidator {
    errors: Vec<FieldError>,
}

impl FieldValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a "required" error when `value` is absent.
    pub fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "field is required");
        }
        value
    }

    /// Requires a string with at least one non-whitespace character; the result is trimmed.
    pub fn required_text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let value = self.required(field, value)?;
        self.text(field, value)
    }

    /// Trims `value` and rejects it when nothing is left.
    pub fn text(&mut self, field: &str, value: String) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "cannot be empty");
            return None;
        }
        Some(trimmed.to_owned())
    }

    /// Requires a parseable timestamp (see [`parse_timestamp`]).
    pub fn required_timestamp(
        &mut self,
        field: &str,
        value: Option<String>,
    ) -> Option<DateTime<Utc>> {
        let value = self.required(field, value)?;
        self.timestamp(field, &value)
    }

    pub fn timestamp(&mut self, field: &str, value: &str) -> Option<DateTime<Utc>> {
        let parsed = parse_timestamp(value);
        if parsed.is_none() {
            self.push(field, "expected an ISO-8601 timestamp");
        }
        parsed
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> ValidationErrors {
        ValidationErrors(self.errors)
    }
}

/// Parses an ISO-8601 timestamp.
///
/// RFC 3339 values keep their offset and are converted to UTC. Values without an offset
/// (`2025-04-15T10:30` or `2025-04-15T10:30:00`, as produced by HTML datetime inputs) are
/// read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// One end of a date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateBound {
    pub at: DateTime<Utc>,
    /// The bound itself is excluded (`<` rather than `<=`).
    pub exclusive: bool,
}

/// Parses a date-range bound: a full timestamp, or a bare `YYYY-MM-DD` date.
///
/// Timestamps are inclusive. A bare date starts at midnight as a lower bound; as an upper
/// bound it becomes the next midnight, exclusive, so the whole day is covered.
pub fn parse_date_bound(value: &str, upper: bool) -> Option<DateBound> {
    if let Some(at) = parse_timestamp(value) {
        return Some(DateBound {
            at,
            exclusive: false,
        });
    }
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()?;
    let day = if upper { date.succ_opt()? } else { date };
    Some(DateBound {
        at: day.and_hms_opt(0, 0, 0)?.and_utc(),
        exclusive: upper,
    })
}
