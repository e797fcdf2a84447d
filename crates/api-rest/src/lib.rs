//! # API REST
//!
//! REST API implementation for Telemed.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, status codes)
//!
//! Uses `api-shared` for common types and `telemed-core` for all data operations.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{DetailRes, HealthRes, TokenReq, TokenRes, ValidationDetailRes};
use telemed_core::{
    Appointment, ConsultationMode, CoreConfig, DashboardStats, DatasetKind, ExportFormat,
    Exporter, Feedback, FieldError, InsertAppointment, InsertFeedback, InsertMedicalRecord,
    InsertReminder, InsertUser, MedicalRecord, Reminder, ReportType, Store, User,
};

pub use error::{ApiError, ApiResult};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub store: Store,
    pub exporter: Exporter,
}

impl AppState {
    /// State whose store is seeded according to `cfg`.
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        let store = Store::from_config(&cfg);
        Self::with_store(cfg, store)
    }

    pub fn with_store(cfg: Arc<CoreConfig>, store: Store) -> Self {
        Self {
            exporter: cfg.exporter(),
            cfg,
            store,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::issue_token,
        handlers::list_users,
        handlers::create_user,
        handlers::get_user,
        handlers::list_appointments,
        handlers::create_appointment,
        handlers::get_appointment,
        handlers::update_appointment,
        handlers::delete_appointment,
        handlers::list_records,
        handlers::create_record,
        handlers::list_reminders,
        handlers::create_reminder,
        handlers::update_reminder,
        handlers::delete_reminder,
        handlers::list_feedback,
        handlers::create_feedback,
        handlers::stats,
        handlers::report,
        handlers::export,
    ),
    components(schemas(
        HealthRes,
        TokenReq,
        TokenRes,
        DetailRes,
        ValidationDetailRes,
        FieldError,
        User,
        InsertUser,
        Appointment,
        InsertAppointment,
        ConsultationMode,
        MedicalRecord,
        InsertMedicalRecord,
        Reminder,
        InsertReminder,
        Feedback,
        InsertFeedback,
        DashboardStats,
        DatasetKind,
        ReportType,
        ExportFormat,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router: API routes, Swagger UI and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/token/", post(handlers::issue_token))
        .route(
            "/api/users/",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/users/:id", get(handlers::get_user))
        .route(
            "/api/appointments/",
            get(handlers::list_appointments).post(handlers::create_appointment),
        )
        .route(
            "/api/appointments/:id",
            get(handlers::get_appointment)
                .patch(handlers::update_appointment)
                .delete(handlers::delete_appointment),
        )
        .route(
            "/api/records/",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route(
            "/api/reminders/",
            get(handlers::list_reminders).post(handlers::create_reminder),
        )
        .route(
            "/api/reminders/:id",
            axum::routing::patch(handlers::update_reminder).delete(handlers::delete_reminder),
        )
        .route(
            "/api/feedbacks/",
            get(handlers::list_feedback).post(handlers::create_feedback),
        )
        .route("/api/stats/", get(handlers::stats))
        .route("/api/reports/:kind", get(handlers::report))
        .route("/api/exports/:kind", get(handlers::export))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
