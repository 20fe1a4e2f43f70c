//! HTTP error bodies: `{"detail": "..."}` with the status mapped from
//! [`PaperError::status_code`].

use crate::error::PaperError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    /// Map `err`, prefixing server-side failures with `context`
    /// (`"Query error: ..."`). Client errors keep their own message.
    pub fn with_context(context: &str, err: PaperError) -> Self {
        let status = status_of(&err);
        if status.is_server_error() {
            Self::new(status, format!("{context}: {err}"))
        } else {
            Self::new(status, err.to_string())
        }
    }
}

fn status_of(err: &PaperError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl From<PaperError> for ApiError {
    fn from(err: PaperError) -> Self {
        Self::new(status_of(&err), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}", self.status.as_u16(), self.detail);
        } else {
            warn!("{} {}", self.status.as_u16(), self.detail);
        }
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn server_errors_get_context_prefix() {
        let e = ApiError::with_context("Query error", PaperError::Internal("boom".into()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.detail, "Query error: Internal error: boom");
    }

    #[test]
    fn client_errors_keep_message() {
        let e = ApiError::with_context(
            "Indexation error",
            PaperError::FileNotFound {
                path: PathBuf::from("/x.pdf"),
            },
        );
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        assert_eq!(e.detail, "PDF not found: /x.pdf");
    }
}
