//! Request and response bodies that are not domain entities.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use telemed_core::{ExportFormat, FieldError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Login payload. Both fields are required; they are optional here so a missing one
/// yields a 400 with a message rather than a decode rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenReq {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TokenRes {
    pub access: String,
    pub token_type: String,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

/// Error body carrying a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetailRes {
    pub detail: String,
}

/// Error body carrying per-field validation problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ValidationDetailRes {
    pub detail: Vec<FieldError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Only patients, with last appointment and record count.
    pub is_patient: Option<bool>,
    /// Only doctors, with rating, specialty and patient count.
    pub is_doctor: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AppointmentListQuery {
    /// Exact status match; `all` or absent lists everything.
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordListQuery {
    pub patient: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Report type offered by the dataset (`all` when absent).
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    /// Inclusive lower bound: RFC 3339 timestamp or `YYYY-MM-DD`.
    pub from: Option<String>,
    /// Inclusive upper bound: RFC 3339 timestamp or `YYYY-MM-DD` (end of day).
    pub to: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportQuery {
    #[param(value_type = Option<String>)]
    pub format: Option<ExportFormat>,
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// CSV header row; defaults to true.
    pub headers: Option<bool>,
}
