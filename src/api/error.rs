//! Dashboard error responses
//!
//! Every failed request gets a JSON body `{ "error": { code, message },
//! "request_id" }`. Server-side failures are logged at `error`, rejected
//! requests at `debug`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures the dashboard server reports
#[derive(Error, Debug)]
pub enum ApiError {
    /// A query parameter is out of range, e.g. `?limit=0`
    #[error("Validation error: {0}")]
    Validation(String),

    /// No route matches the request path
    #[error("Not found: {0}")]
    NotFound(String),

    /// Page rendering or the server loop failed
    #[error("Internal error: {0}")]
    Internal(String),

    /// The listener could not bind to the configured address
    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) | ApiError::Bind { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for the JSON body
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Internal(_) => "INTERNAL_ERROR",
            ApiError::Bind { .. } => "BIND_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
    request_id: String,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(request_id = %request_id, code, error = %self, "Dashboard request failed");
        } else {
            tracing::debug!(request_id = %request_id, code, error = %self, "Request rejected");
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let resp = ApiError::Validation("limit must be at least 1".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = ApiError::NotFound("/nope".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError::Internal("boom".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_bind_error_message() {
        let err = ApiError::Bind {
            addr: "0.0.0.0:8050".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(err.code(), "BIND_ERROR");
        assert_eq!(err.to_string(), "Cannot listen on 0.0.0.0:8050: address in use");
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::NotFound("/api/v1/unknown".to_string());
        assert_eq!(err.to_string(), "Not found: /api/v1/unknown");
    }
}
