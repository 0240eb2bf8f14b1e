use axum::{Json, response::IntoResponse};
use sqlx::{Error as SqlxError, error::DatabaseError};
use tracing::error;

/// Application error type for HTTP handlers and services.
#[derive(Debug)]
pub struct AppError {
    pub status: axum::http::StatusCode,
    pub code: &'static str,
    pub message: String,
}

pub type ApiResult<T> = std::result::Result<T, AppError>;

const DB_UNAVAILABLE_MESSAGE: &str = "database temporarily unavailable";

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::BAD_REQUEST,
            code: "bad_request",
            message: msg.into(),
        }
    }

    pub fn invalid_url(msg: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::BAD_REQUEST,
            code: "invalid_url",
            message: msg.into(),
        }
    }

    pub fn invalid_duration(msg: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::BAD_REQUEST,
            code: "invalid_duration",
            message: msg.into(),
        }
    }

    pub fn quota_exceeded(msg: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::BAD_REQUEST,
            code: "quota_exceeded",
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::NOT_FOUND,
            code: "not_found",
            message: msg.into(),
        }
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self {
            status: axum::http::StatusCode::SERVICE_UNAVAILABLE,
            code: "service_unavailable",
            message: msg.into(),
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: msg.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DbErrorKind {
    UniqueViolation,
    CheckViolation,
    Busy,
}

fn map_anyhow_error(err: &anyhow::Error) -> Option<AppError> {
    let sqlx_err = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<SqlxError>())?;
    map_sqlx_error(sqlx_err)
}

fn map_sqlx_error(err: &SqlxError) -> Option<AppError> {
    match err {
        SqlxError::RowNotFound => Some(AppError::not_found("resource not found")),
        SqlxError::Database(db_err) => map_database_error(db_err.as_ref()),
        SqlxError::PoolTimedOut | SqlxError::PoolClosed => {
            Some(AppError::service_unavailable(DB_UNAVAILABLE_MESSAGE))
        }
        SqlxError::Io(_) => Some(AppError::service_unavailable(DB_UNAVAILABLE_MESSAGE)),
        _ => None,
    }
}

fn map_database_error(err: &dyn DatabaseError) -> Option<AppError> {
    let kind = classify_db_error(err.code().as_deref(), err.message())?;
    match kind {
        DbErrorKind::UniqueViolation => Some(AppError::bad_request("resource already exists")),
        DbErrorKind::CheckViolation => Some(AppError::bad_request("invalid request")),
        DbErrorKind::Busy => Some(AppError::service_unavailable(DB_UNAVAILABLE_MESSAGE)),
    }
}

fn classify_db_error(code: Option<&str>, message: &str) -> Option<DbErrorKind> {
    let code = code.unwrap_or_default();
    let message = message.to_ascii_lowercase();

    if matches!(code, "2067" | "1555") || message.contains("unique constraint") {
        return Some(DbErrorKind::UniqueViolation);
    }

    if code == "275" || message.contains("check constraint") {
        return Some(DbErrorKind::CheckViolation);
    }

    if message.contains("database is locked") || message.contains("database is busy") {
        return Some(DbErrorKind::Busy);
    }

    None
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(mapped) = map_anyhow_error(&err) {
            if mapped.status.is_server_error() {
                error!(?err, "internal error");
            }
            return mapped;
        }

        error!(?err, "internal error");
        AppError::internal("internal server error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(serde_json::json!({
            "error": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}
