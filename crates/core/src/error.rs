use crate::models::Resource;
use crate::report::DatasetKind;
use crate::validation::ValidationErrors;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("{} not found", .resource.label())]
    NotFound { resource: Resource, id: i64 },
    #[error("unknown dataset kind: {0}")]
    UnknownDatasetKind(String),
    #[error("report type {report_type:?} is not available for {kind}")]
    UnknownReportType {
        kind: DatasetKind,
        report_type: String,
    },
    #[error("invalid date bound: {0}")]
    InvalidDate(String),
    #[error("in-memory store lock was poisoned")]
    StorePoisoned,
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
