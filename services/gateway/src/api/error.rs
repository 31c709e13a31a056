//! API error types and helpers.
//!
//! # Key invariants
//! - Error responses carry a stable `code` and a human-readable `message`.
//! - Rejections from the authorization gate never echo token contents.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use carwash_authz::{AuthError, Rejection};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            code: code.to_string(),
            message: message.to_string(),
            request_id: None,
        },
    }
}

pub fn api_unauthorized(message: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 500 error. The detail is logged, never returned.
pub fn api_internal(message: &str, err: &dyn std::error::Error) -> ApiError {
    tracing::error!(error = %err, "gateway internal error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_unavailable(message: &str) -> ApiError {
    api_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
}

pub fn api_gateway_timeout(message: &str) -> ApiError {
    api_error(StatusCode::GATEWAY_TIMEOUT, "deadline_exceeded", message)
}

fn unauthorized_message(err: &AuthError) -> &'static str {
    match err {
        AuthError::MissingCredential => "authorization header is required",
        AuthError::UnsupportedAlgorithm(_) | AuthError::InvalidToken(_) => {
            "token could not be verified"
        }
        AuthError::MalformedClaims(_) => "token claims are invalid",
        AuthError::InvalidSubjectFormat(_) | AuthError::UnknownSubject(_) => "invalid user",
    }
}

/// Map a gate rejection to its HTTP response.
pub fn api_rejection(rejection: &Rejection) -> ApiError {
    match rejection {
        Rejection::Unauthorized(err) => api_unauthorized(unauthorized_message(err)),
        Rejection::Forbidden { .. } => api_forbidden(&rejection.to_string()),
        Rejection::PolicyUnavailable(err) => api_internal("access policy unavailable", err),
        Rejection::DeadlineExceeded { .. } => api_gateway_timeout("authorization timed out"),
    }
}
