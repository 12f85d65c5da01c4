use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::model::review::ReviewStatus;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    /// Rejected before any network call; nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error("Invalid review transition: {from} -> {to}")]
    InvalidTransition { from: ReviewStatus, to: ReviewStatus },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Declared key matched {matched} rows in {table}")]
    AmbiguousKey { table: String, matched: u64 },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Warehouse error: {message}")]
    Warehouse { message: String },

    #[error("Platform API error ({status}): {message}")]
    Platform { status: u16, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Unsupported: {message}")]
    Unsupported { message: String },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {message}")]
    Io { message: String },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound {
            message: message.into(),
        }
    }

    pub fn warehouse(message: impl Into<String>) -> Self {
        AppError::Warehouse {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        AppError::Storage {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io {
            message: err.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Csv(_) | AppError::Unsupported { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::InvalidTransition { .. } | AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Warehouse { .. }
            | AppError::Storage { .. }
            | AppError::Platform { .. }
            | AppError::Sqlite(_)
            | AppError::Http(_)
            | AppError::ObjectStore(_) => StatusCode::BAD_GATEWAY,
            AppError::AmbiguousKey { .. }
            | AppError::Config { .. }
            | AppError::Json(_)
            | AppError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(format!("Error: {}", self))
    }
}
