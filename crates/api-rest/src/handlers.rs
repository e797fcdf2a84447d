//! Request handlers for the REST API.
//!
//! Handlers are thin: they extract, call into the shared [`Store`](telemed_core::Store), and
//! let [`ApiError`] turn failures into responses.

use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;

use api_shared::auth::issue_mock_token;
use api_shared::{
    AppointmentListQuery, DetailRes, ExportQuery, HealthRes, HealthService, RecordListQuery,
    ReportQuery, TokenReq, TokenRes, UserListQuery, ValidationDetailRes,
};
use telemed_core::{
    Appointment, AppointmentStatus, DashboardStats, Dataset, DatasetKind, DateRange,
    ExportOptions, Feedback, InsertAppointment, InsertFeedback, InsertMedicalRecord,
    InsertReminder, InsertUser, MedicalRecord, Reminder, ReportType, Selection, User, UserRole,
    ValidationErrors,
};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
pub async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/api/token/",
    request_body = TokenReq,
    responses(
        (status = 200, description = "Access token issued", body = TokenRes),
        (status = 400, description = "Username or password missing", body = DetailRes)
    )
)]
/// Issue a mock access token
///
/// Any non-empty username and password pair is accepted.
#[axum::debug_handler]
pub async fn issue_token(
    State(_state): State<AppState>,
    Json(req): Json<TokenReq>,
) -> ApiResult<Json<TokenRes>> {
    Ok(Json(issue_mock_token(&req)?))
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/users/",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users, with role details when filtered by role", body = [User]),
        (status = 500, description = "Internal server error", body = DetailRes)
    )
)]
/// List users
///
/// `is_patient=true` takes precedence over `is_doctor=true`. Passwords are never returned.
#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<Vec<User>>> {
    let role = if query.is_patient == Some(true) {
        Some(UserRole::Patient)
    } else if query.is_doctor == Some(true) {
        Some(UserRole::Doctor)
    } else {
        None
    };
    Ok(Json(state.store.list_users(role)?))
}

#[utoipa::path(
    post,
    path = "/api/users/",
    request_body = InsertUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation failed", body = ValidationDetailRes)
    )
)]
#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<InsertUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let user = state.store.create_user(payload)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 404, description = "User not found", body = DetailRes)
    )
)]
#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.store.get_user(id)?))
}

// ─── Appointments ────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/appointments/",
    params(AppointmentListQuery),
    responses(
        (status = 200, description = "Appointments with joined names", body = [Appointment])
    )
)]
#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentListQuery>,
) -> ApiResult<Json<Vec<Appointment>>> {
    let status: Selection<AppointmentStatus> = query
        .status
        .as_deref()
        .unwrap_or_default()
        .parse()
        .unwrap_or_default();
    Ok(Json(state.store.list_appointments(&status)?))
}

#[utoipa::path(
    post,
    path = "/api/appointments/",
    request_body = InsertAppointment,
    responses(
        (status = 201, description = "Appointment created", body = Appointment),
        (status = 400, description = "Validation failed", body = ValidationDetailRes)
    )
)]
#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(payload): Json<InsertAppointment>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    let appointment = state.store.create_appointment(payload)?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    params(("id" = i64, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment", body = Appointment),
        (status = 404, description = "Appointment not found", body = DetailRes)
    )
)]
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.store.get_appointment(id)?))
}

#[utoipa::path(
    patch,
    path = "/api/appointments/{id}",
    params(("id" = i64, Path, description = "Appointment id")),
    request_body = InsertAppointment,
    responses(
        (status = 200, description = "Merged and stored appointment", body = Appointment),
        (status = 400, description = "Validation failed", body = ValidationDetailRes),
        (status = 404, description = "Appointment not found", body = DetailRes)
    )
)]
/// Partially update an appointment
///
/// Fields present in the body replace the stored ones; the merged appointment is validated
/// and persisted.
#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<InsertAppointment>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.store.update_appointment(id, patch)?))
}

#[utoipa::path(
    delete,
    path = "/api/appointments/{id}",
    params(("id" = i64, Path, description = "Appointment id")),
    responses(
        (status = 204, description = "Appointment deleted"),
        (status = 404, description = "Appointment not found", body = DetailRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete_appointment(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Medical records ─────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/records/",
    params(RecordListQuery),
    responses(
        (status = 200, description = "Medical records", body = [MedicalRecord])
    )
)]
#[axum::debug_handler]
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordListQuery>,
) -> ApiResult<Json<Vec<MedicalRecord>>> {
    Ok(Json(state.store.list_records(query.patient)?))
}

#[utoipa::path(
    post,
    path = "/api/records/",
    request_body(
        content = InsertMedicalRecord,
        description = "JSON body, or multipart/form-data whose `file` part contributes its file name"
    ),
    responses(
        (status = 201, description = "Medical record created", body = MedicalRecord),
        (status = 400, description = "Validation failed", body = ValidationDetailRes)
    )
)]
/// Create a medical record
///
/// Accepts JSON or a multipart form. Uploaded file contents are not stored; only the file
/// name is kept.
#[axum::debug_handler]
pub async fn create_record(
    State(state): State<AppState>,
    request: Request,
) -> ApiResult<(StatusCode, Json<MedicalRecord>)> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let payload = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        record_from_multipart(multipart).await?
    } else {
        let Json(payload) = Json::<InsertMedicalRecord>::from_request(request, &state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        payload
    };

    let record = state.store.create_record(payload)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Reads a record form. Text fields that fail to parse are reported together with whatever
/// else the payload is missing.
async fn record_from_multipart(mut multipart: Multipart) -> ApiResult<InsertMedicalRecord> {
    let mut payload = InsertMedicalRecord::default();
    let mut parse_errors = ValidationErrors::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        if name == "file" {
            payload.file = field.file_name().map(str::to_owned);
            continue;
        }
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        match name.as_str() {
            "patient" => match text.trim().parse::<i64>() {
                Ok(patient) => payload.patient = Some(patient),
                Err(_) => {
                    parse_errors = parse_errors
                        .merge(ValidationErrors::single("patient", "expected an integer id"))
                }
            },
            "diagnosis" => payload.diagnosis = Some(text),
            "treatment" => payload.treatment = Some(text),
            _ => {}
        }
    }
    if parse_errors.is_empty() {
        return Ok(payload);
    }
    let errors = match payload.validate(0, Utc::now()) {
        Ok(_) => parse_errors,
        Err(missing) => parse_errors.merge(missing),
    };
    Err(errors.into())
}

// ─── Reminders ───────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/reminders/",
    responses(
        (status = 200, description = "Reminders", body = [Reminder])
    )
)]
#[axum::debug_handler]
pub async fn list_reminders(State(state): State<AppState>) -> ApiResult<Json<Vec<Reminder>>> {
    Ok(Json(state.store.list_reminders()?))
}

#[utoipa::path(
    post,
    path = "/api/reminders/",
    request_body = InsertReminder,
    responses(
        (status = 201, description = "Reminder created", body = Reminder),
        (status = 400, description = "Validation failed", body = ValidationDetailRes)
    )
)]
#[axum::debug_handler]
pub async fn create_reminder(
    State(state): State<AppState>,
    Json(payload): Json<InsertReminder>,
) -> ApiResult<(StatusCode, Json<Reminder>)> {
    let reminder = state.store.create_reminder(payload)?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

#[utoipa::path(
    patch,
    path = "/api/reminders/{id}",
    params(("id" = i64, Path, description = "Reminder id")),
    request_body = InsertReminder,
    responses(
        (status = 200, description = "Merged and stored reminder", body = Reminder),
        (status = 400, description = "Validation failed", body = ValidationDetailRes),
        (status = 404, description = "Reminder not found", body = DetailRes)
    )
)]
#[axum::debug_handler]
pub async fn update_reminder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<InsertReminder>,
) -> ApiResult<Json<Reminder>> {
    Ok(Json(state.store.update_reminder(id, patch)?))
}

#[utoipa::path(
    delete,
    path = "/api/reminders/{id}",
    params(("id" = i64, Path, description = "Reminder id")),
    responses(
        (status = 204, description = "Reminder deleted"),
        (status = 404, description = "Reminder not found", body = DetailRes)
    )
)]
#[axum::debug_handler]
pub async fn delete_reminder(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete_reminder(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ─── Feedback ────────────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/feedbacks/",
    responses(
        (status = 200, description = "Feedback", body = [Feedback])
    )
)]
#[axum::debug_handler]
pub async fn list_feedback(State(state): State<AppState>) -> ApiResult<Json<Vec<Feedback>>> {
    Ok(Json(state.store.list_feedback()?))
}

#[utoipa::path(
    post,
    path = "/api/feedbacks/",
    request_body = InsertFeedback,
    responses(
        (status = 201, description = "Feedback created", body = Feedback),
        (status = 400, description = "Validation failed", body = ValidationDetailRes)
    )
)]
#[axum::debug_handler]
pub async fn create_feedback(
    State(state): State<AppState>,
    Json(payload): Json<InsertFeedback>,
) -> ApiResult<(StatusCode, Json<Feedback>)> {
    let feedback = state.store.create_feedback(payload)?;
    Ok((StatusCode::CREATED, Json(feedback)))
}

// ─── Stats, reports, exports ─────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/stats/",
    responses(
        (status = 200, description = "Dashboard figures", body = DashboardStats)
    )
)]
#[axum::debug_handler]
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(state.store.stats()?))
}

fn load_report(
    state: &AppState,
    kind: &str,
    report_type: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> ApiResult<Dataset> {
    let kind: DatasetKind = kind.parse()?;
    let report_type = ReportType::parse_for(kind, report_type.unwrap_or_default())?;
    let range = DateRange::parse(from, to)?;
    Ok(state
        .store
        .dataset(kind)?
        .report(report_type, &range, Utc::now())?)
}

#[utoipa::path(
    get,
    path = "/api/reports/{kind}",
    params(
        ("kind" = DatasetKind, Path, description = "Dataset to report on"),
        ReportQuery
    ),
    responses(
        (status = 200, description = "Records of the requested kind matching the report"),
        (status = 400, description = "Unknown report type or bad date bound", body = DetailRes),
        (status = 404, description = "Unknown dataset", body = DetailRes)
    )
)]
/// Generate a report
///
/// Applies the report type, then the inclusive date range, to the whole dataset.
#[axum::debug_handler]
pub async fn report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<Dataset>> {
    let dataset = load_report(
        &state,
        &kind,
        query.report_type.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )?;
    Ok(Json(dataset))
}

#[utoipa::path(
    get,
    path = "/api/exports/{kind}",
    params(
        ("kind" = DatasetKind, Path, description = "Dataset to export"),
        ExportQuery
    ),
    responses(
        (status = 200, description = "Export file as an attachment"),
        (status = 400, description = "Empty dataset, unknown report type or bad date bound", body = DetailRes),
        (status = 404, description = "Unknown dataset", body = DetailRes),
        (status = 501, description = "PDF export is not yet available", body = DetailRes)
    )
)]
/// Export a report as a file
///
/// The body is the file content; `Content-Disposition` carries the generated file name.
#[axum::debug_handler]
pub async fn export(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let dataset = load_report(
        &state,
        &kind,
        query.report_type.as_deref(),
        query.from.as_deref(),
        query.to.as_deref(),
    )?;
    let options = ExportOptions {
        include_headers: query.headers.unwrap_or(true),
    };
    let file = dataset.export(&state.exporter, query.format.unwrap_or_default(), options)?;
    tracing::info!(file = %file.file_name, rows = dataset.len(), "export served");

    Ok((
        [
            (header::CONTENT_TYPE, file.mime_type.to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.content,
    )
        .into_response())
}
