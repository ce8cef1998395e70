//! Handler error type.
//!
//! Every handler returns `Result<_, ApiError>`; the `IntoResponse` impl is the
//! only place where failures turn into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("invalid submission ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

impl ApiError {
    /// Classify a failed write. Unique-constraint violations name the record
    /// that collided; anything else stays a database error.
    pub fn from_write(err: DbErr, what: impl Into<String>) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::AlreadyExists(what.into()),
            _ => Self::Database(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyExists(_) | Self::Validation(_) | Self::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AlreadyExists(_) => "already_exists",
            Self::Validation(_) => "validation",
            Self::Database(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "request failed");
                "An error occurred. The request could not be completed.".to_string()
            }
            other => {
                tracing::warn!(kind = other.kind(), "{other}");
                other.to_string()
            }
        };

        let mut body = serde_json::json!({
            "error": self.kind(),
            "message": message,
        });
        if let Self::Validation(fields) = &self {
            body["fields"] = serde_json::json!(fields);
        }

        (self.status(), Json(body)).into_response()
    }
}
