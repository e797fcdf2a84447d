//! Mapping of domain errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use api_shared::auth::AuthError;
use api_shared::{DetailRes, ValidationDetailRes};
use telemed_core::{CoreError, ExportError, ValidationErrors};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    BadRequest(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Core(CoreError::Validation(errors))
    }
}

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(DetailRes {
            detail: message.into(),
        }),
    )
        .into_response()
}

fn internal(error: &dyn std::fmt::Debug) -> Response {
    tracing::error!("Internal server error: {:?}", error);
    detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Core(CoreError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationDetailRes {
                    detail: errors.into_errors(),
                }),
            )
                .into_response(),
            ApiError::Core(e @ CoreError::NotFound { .. })
            | ApiError::Core(e @ CoreError::UnknownDatasetKind(_)) => {
                detail(StatusCode::NOT_FOUND, e.to_string())
            }
            ApiError::Core(
                e @ (CoreError::UnknownReportType { .. }
                | CoreError::InvalidDate(_)
                | CoreError::InvalidInput(_)),
            ) => detail(StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::Core(e @ CoreError::StorePoisoned) => internal(&e),
            ApiError::Export(ExportError::EmptyDataset) => {
                tracing::warn!("export rejected: empty dataset");
                detail(StatusCode::BAD_REQUEST, ExportError::EmptyDataset.to_string())
            }
            ApiError::Export(e @ ExportError::PdfUnavailable { .. }) => {
                tracing::warn!("export rejected: {e}");
                detail(StatusCode::NOT_IMPLEMENTED, e.to_string())
            }
            ApiError::Export(e) => internal(&e),
            ApiError::Auth(e) => detail(StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::BadRequest(message) => detail(StatusCode::BAD_REQUEST, message),
        }
    }
}
