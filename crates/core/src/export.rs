//! Export serializer: CSV and JSON files built from any serializable record list.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{CSV_EXCLUDED_FIELDS, DEFAULT_EXPORT_PREFIX, SANITIZED_FIELDS};
use crate::report::DatasetKind;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("nothing to export: the dataset is empty")]
    EmptyDataset,
    #[error("PDF export is not yet available")]
    PdfUnavailable { kind: DatasetKind, count: usize },
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("export output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record {index} does not serialize to an object")]
    NotAnObject { index: usize },
}

pub type ExportResult<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv;charset=utf-8",
            ExportFormat::Json => "application/json",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Emit the CSV header row.
    pub include_headers: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_headers: true,
        }
    }
}

/// A finished export, ready to be written or sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub content: String,
}

impl ExportFile {
    /// Writes the content to `dir/<file_name>` and returns the full path.
    pub fn write_to(&self, dir: &Path) -> ExportResult<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.content.as_bytes())?;
        Ok(path)
    }
}

/// Builds export files with a configurable filename prefix.
#[derive(Debug, Clone)]
pub struct Exporter {
    prefix: String,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_PREFIX)
    }
}

impl Exporter {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn export<T: Serialize>(
        &self,
        kind: DatasetKind,
        items: &[T],
        format: ExportFormat,
        options: ExportOptions,
    ) -> ExportResult<ExportFile> {
        self.export_at(kind, items, format, options, Utc::now())
    }

    /// Like [`Exporter::export`] with an explicit clock, which only affects the filename.
    ///
    /// # Errors
    ///
    /// - `ExportError::EmptyDataset` if `items` is empty (checked first).
    /// - `ExportError::PdfUnavailable` for [`ExportFormat::Pdf`].
    /// - Serialization errors if a record cannot be encoded.
    pub fn export_at<T: Serialize>(
        &self,
        kind: DatasetKind,
        items: &[T],
        format: ExportFormat,
        options: ExportOptions,
        now: DateTime<Utc>,
    ) -> ExportResult<ExportFile> {
        if items.is_empty() {
            return Err(ExportError::EmptyDataset);
        }
        let content = match format {
            ExportFormat::Csv => to_csv(items, options)?,
            ExportFormat::Json => to_json(items)?,
            ExportFormat::Pdf => {
                return Err(ExportError::PdfUnavailable {
                    kind,
                    count: items.len(),
                });
            }
        };
        let file_name = export_file_name(&self.prefix, kind, format, now);
        tracing::debug!(%kind, %format, rows = items.len(), file = %file_name, "export built");
        Ok(ExportFile {
            file_name,
            mime_type: format.mime_type(),
            content,
        })
    }
}

/// `<prefix>_<kind>_<timestamp>.<ext>`, the timestamp being millisecond RFC 3339 UTC
/// with `:` and `.` replaced by `-`.
pub fn export_file_name(
    prefix: &str,
    kind: DatasetKind,
    format: ExportFormat,
    now: DateTime<Utc>,
) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{prefix}_{}_{stamp}.{}", kind.as_str(), format.extension())
}

fn to_objects<T: Serialize>(items: &[T]) -> ExportResult<Vec<Map<String, Value>>> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match serde_json::to_value(item)? {
            Value::Object(map) => Ok(map),
            _ => Err(ExportError::NotAnObject { index }),
        })
        .collect()
}

/// One CSV cell: null is empty, strings verbatim, containers as embedded JSON.
pub fn csv_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// CSV with headers taken from the first record, minus the excluded fields.
///
/// Quoting is RFC 4180 minimal quoting: a cell is quoted when it holds a comma, a double
/// quote, `\n` or `\r`, and a row made of a single empty cell is written as `""` so it is
/// not read back as a blank line.
pub fn to_csv<T: Serialize>(items: &[T], options: ExportOptions) -> ExportResult<String> {
    let rows = to_objects(items)?;
    let Some(first) = rows.first() else {
        return Err(ExportError::EmptyDataset);
    };
    let headers: Vec<&str> = first
        .keys()
        .map(String::as_str)
        .filter(|key| !CSV_EXCLUDED_FIELDS.contains(key))
        .collect();

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    if options.include_headers {
        writer.write_record(&headers)?;
    }
    for row in &rows {
        writer.write_record(
            headers
                .iter()
                .map(|key| row.get(*key).map(csv_value).unwrap_or_default()),
        )?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    let mut text = String::from_utf8(bytes)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// Pretty-printed JSON array with sensitive fields removed.
pub fn to_json<T: Serialize>(items: &[T]) -> ExportResult<String> {
    let sanitized: Vec<Value> = to_objects(items)?
        .into_iter()
        .map(|mut map| {
            for field in SANITIZED_FIELDS {
                map.remove(field);
            }
            Value::Object(map)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&sanitized)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Feedback, User};
    use chrono::TimeZone;

    fn feedback(id: i64, comment: &str) -> Feedback {
        Feedback {
            id,
            patient: 1,
            patient_name: None,
            doctor: 2,
            doctor_name: None,
            rating: 3,
            comment: comment.into(),
        }
    }

    fn user_with_password() -> User {
        User {
            id: 7,
            username: "smartin".into(),
            password: Some("hunter2".into()),
            email: "sophie.martin@example.fr".into(),
            is_patient: false,
            is_doctor: true,
            name: Some("Dr. Sophie Martin".into()),
            specialty: None,
            rating: None,
            patient_count: None,
            last_appointment: None,
            record_count: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 14, 12, 30, 5).unwrap()
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_csv_quotes_commas() {
        let csv = to_csv(&[feedback(1, "Good, but slow")], ExportOptions::default()).unwrap();
        assert_eq!(csv, "patient,doctor,rating,comment\n1,2,3,\"Good, but slow\"");
    }

    #[test]
    fn test_csv_doubles_quotes_and_keeps_newlines_quoted() {
        let csv = to_csv(
            &[feedback(1, "He said \"fine\"\nthen left")],
            ExportOptions {
                include_headers: false,
            },
        )
        .unwrap();
        assert_eq!(csv, "1,2,3,\"He said \"\"fine\"\"\nthen left\"");
    }

    #[test]
    fn test_csv_quotes_carriage_returns_and_lone_empty_cells() {
        let csv = to_csv(
            &[feedback(1, "line\rbreak"), feedback(2, "no quotes needed")],
            ExportOptions {
                include_headers: false,
            },
        )
        .unwrap();
        assert_eq!(csv, "1,2,3,\"line\rbreak\"\n2,2,3,no quotes needed");

        let single = [serde_json::json!({"note": null}), serde_json::json!({"note": "x"})];
        let csv = to_csv(&single, ExportOptions::default()).unwrap();
        assert_eq!(csv, "note\n\"\"\nx");
    }

    #[test]
    fn test_csv_round_trips_through_reader() {
        let items = vec![
            feedback(1, "Good, but slow"),
            feedback(2, "Très \"bien\""),
            feedback(3, "plain"),
        ];
        let csv = to_csv(&items, ExportOptions::default()).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_owned)
            .collect();
        assert_eq!(headers, vec!["patient", "doctor", "rating", "comment"]);
        let comments: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[3].to_owned())
            .collect();
        assert_eq!(comments, vec!["Good, but slow", "Très \"bien\"", "plain"]);
    }

    #[test]
    fn test_csv_excludes_password_and_id() {
        let csv = to_csv(&[user_with_password()], ExportOptions::default()).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(!header.split(',').any(|h| h == "password" || h == "id"));
        assert!(!csv.contains("hunter2"));
    }

    #[test]
    fn test_json_strips_password() {
        let json = to_json(&[user_with_password()]).unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert!(parsed[0].get("password").is_none());
        assert_eq!(parsed[0]["username"], "smartin");
        assert_eq!(parsed[0]["id"], 7);
    }

    #[test]
    fn test_export_is_idempotent_except_filename() {
        let exporter = Exporter::default();
        let items = vec![feedback(1, "ok"), feedback(2, "Good, but slow")];
        let first = exporter
            .export_at(DatasetKind::Feedback, &items, ExportFormat::Csv, ExportOptions::default(), now())
            .unwrap();
        let second = exporter
            .export(DatasetKind::Feedback, &items, ExportFormat::Csv, ExportOptions::default())
            .unwrap();
        assert_eq!(first.content, second.content);
        assert_eq!(first.mime_type, "text/csv;charset=utf-8");
    }

    #[test]
    fn test_file_name_format() {
        let name = export_file_name("telemed", DatasetKind::Appointments, ExportFormat::Json, now());
        assert_eq!(name, "telemed_appointments_2025-04-14T12-30-05-123Z.json");
    }

    #[test]
    fn test_empty_dataset_is_rejected_before_format() {
        let exporter = Exporter::new("clinic");
        let empty: Vec<Feedback> = Vec::new();
        for format in [ExportFormat::Csv, ExportFormat::Json, ExportFormat::Pdf] {
            let err = exporter
                .export(DatasetKind::Feedback, &empty, format, ExportOptions::default())
                .unwrap_err();
            assert!(matches!(err, ExportError::EmptyDataset));
        }
    }

    #[test]
    fn test_pdf_is_unavailable() {
        let err = Exporter::default()
            .export(
                DatasetKind::Feedback,
                &[feedback(1, "ok")],
                ExportFormat::Pdf,
                ExportOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::PdfUnavailable { kind: DatasetKind::Feedback, count: 1 }
        ));
        assert_eq!(err.to_string(), "PDF export is not yet available");
    }

    #[test]
    fn test_non_object_records_are_rejected() {
        let err = to_csv(&[1, 2], ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ExportError::NotAnObject { index: 0 }));
    }

    #[test]
    fn test_write_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = Exporter::new("clinic")
            .export_at(
                DatasetKind::Feedback,
                &[feedback(1, "ok")],
                ExportFormat::Json,
                ExportOptions::default(),
                now(),
            )
            .unwrap();
        let path = file.write_to(dir.path()).unwrap();
        assert!(path.ends_with("clinic_feedback_2025-04-14T12-30-05-123Z.json"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), file.content);
    }
}
