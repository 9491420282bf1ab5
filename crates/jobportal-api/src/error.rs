//! API error types and the centralized error handler.
//!
//! Every failure response is shaped here: handler errors through
//! [`ApiError`]'s `IntoResponse`, panics through [`handle_panic`], and
//! unmatched routes through [`not_found`]. The [`handle_errors`] middleware
//! wraps the route handlers and logs every error they produce.

use std::any::Any;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use jobportal_db::DbError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Message returned for internal errors when details are hidden.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::Validation(_) => "validation_error",
            ApiError::Internal(_) => "internal_error",
            ApiError::Database(_) => "database_error",
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, ApiError::Internal(_) | ApiError::Database(_))
    }
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Attached to every error response for [`handle_errors`].
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub body: ErrorResponse,
    /// Full error text; only set when the public message is generic.
    pub detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, detail) = if self.is_internal() {
            (INTERNAL_ERROR_MESSAGE.to_string(), Some(self.to_string()))
        } else {
            (self.to_string(), None)
        };

        let body = ErrorResponse {
            success: false,
            message,
            code: Some(self.code().to_string()),
        };

        let mut response = (status, Json(body.clone())).into_response();
        response
            .extensions_mut()
            .insert(ErrorReport { body, detail });
        response
    }
}

/// How much the error handler reveals to clients.
#[derive(Debug, Clone, Copy)]
pub struct ErrorPolicy {
    pub expose_details: bool,
}

/// Centralized error handling middleware.
///
/// Logs every error response produced below it and, outside production,
/// swaps the generic internal-error message for the real one.
pub async fn handle_errors(
    State(policy): State<ErrorPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    let status = response.status();
    let detail = report.detail.as_deref().unwrap_or(&report.body.message);
    if status.is_server_error() {
        error!(method = %method, path = %path, status = %status, "Request failed: {}", detail);
    } else {
        warn!(method = %method, path = %path, status = %status, "Request rejected: {}", detail);
    }

    match report.detail {
        Some(detail) if policy.expose_details => {
            let body = ErrorResponse {
                message: detail,
                ..report.body
            };
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(header::CONTENT_LENGTH);
            match serde_json::to_vec(&body) {
                Ok(bytes) => Response::from_parts(parts, Body::from(bytes)),
                Err(_) => Response::from_parts(parts, Body::empty()),
            }
        }
        _ => response,
    }
}

/// Turn a handler panic into a regular 500 response.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError::internal(format!("handler panicked: {}", detail)).into_response()
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route {} not found", uri.path()))
}
