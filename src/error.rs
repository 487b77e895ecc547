use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// One failed validation rule, addressed by its JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        let path = if field.is_empty() {
            Vec::new()
        } else {
            vec![field.to_string()]
        };
        Self {
            path,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation failed: {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(e) => match database_message(e) {
                Some(_) => StatusCode::BAD_REQUEST,
                None => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Maps a PostgreSQL SQLSTATE code to the message shown to clients.
pub fn constraint_message(code: &str) -> &'static str {
    match code {
        "23505" => "Unique constraint failed",
        "23503" => "Foreign key constraint failed",
        "23502" => "Null constraint violation",
        "23514" => "A constraint failed on the database",
        "22001" => "The provided value for the field is invalid",
        "22003" => "Value out of range for the type",
        "22007" | "22008" => "Data validation error",
        "22P02" => "Inconsistent column data",
        "42P01" => "The table does not exist in the current database",
        "42703" => "The column does not exist in the current database",
        _ => "Database error",
    }
}

/// Returns the client-facing message for datastore errors that are reported
/// as bad requests. `None` means the error is unexpected and becomes a 500.
fn database_message(err: &sqlx::Error) -> Option<&'static str> {
    match err {
        sqlx::Error::Database(db) => Some(db.code().map_or("Database error", |c| constraint_message(&c))),
        sqlx::Error::PoolTimedOut => {
            Some("Timed out fetching a new connection from the connection pool")
        }
        sqlx::Error::RowNotFound => Some("Record not found"),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            AppError::Validation(issues) => serde_json::json!({ "errors": issues }),
            AppError::NotFound(msg) | AppError::Unauthorized(msg) | AppError::Conflict(msg) => {
                serde_json::json!({ "error": msg })
            }
            AppError::Database(e) => match database_message(&e) {
                Some(msg) => {
                    tracing::warn!("Datastore rejected request: {}", e);
                    serde_json::json!({ "error": msg })
                }
                None => {
                    tracing::error!("Unexpected datastore failure: {}", e);
                    serde_json::json!({ "errors": "Internal server error" })
                }
            },
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                serde_json::json!({ "errors": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
