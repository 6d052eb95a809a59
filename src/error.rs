use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

use crate::store::StoreError;

#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "Bad Request: {}", _0)]
    BadRequest(String),
    #[display(fmt = "Validation failed: {}", "_0.join(\", \")")]
    Validation(Vec<String>),
    #[display(fmt = "Unauthorized: {}", _0)]
    Unauthorized(String),
    #[display(fmt = "Forbidden: {}", _0)]
    Forbidden(String),
    #[display(fmt = "Not Found: {}", _0)]
    NotFound(String),
    #[display(fmt = "Conflict: {}", _0)]
    Conflict(String),
    #[display(fmt = "Internal Server Error: {}", _0)]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a [String]>,
}

impl AppError {
    fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => msg,
            AppError::Validation(_) => "Validation failed",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let details = match self {
            AppError::Validation(errors) => Some(errors.as_slice()),
            _ => None,
        };

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.message(),
            details,
        })
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => format!("{field}: {message}"),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages)
    }
}

/// Maps a failed read to a generic 500, logging the store error.
pub fn read_failure(operation: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |err| {
        tracing::error!(error = %err, operation, "Read failed");
        AppError::Internal(format!("Error {operation}"))
    }
}

/// Maps a failed write to an error naming the operation. Conflicts and
/// dangling references keep their own status so the caller can fix the input.
pub fn write_failure(operation: &'static str) -> impl FnOnce(StoreError) -> AppError {
    move |err| match err {
        StoreError::Conflict(msg) => AppError::Conflict(msg),
        StoreError::InvalidReference(msg) => AppError::BadRequest(msg),
        other => {
            tracing::error!(error = %other, operation, "Write failed");
            AppError::Internal(format!("Error {operation}"))
        }
    }
}
