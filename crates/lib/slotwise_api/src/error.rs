//! Application error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Domain does not accept mail: {0}")]
    InvalidDomain(String),

    #[error("Rate limited; retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: i64 },

    #[error("Availability unconfigured: {0}")]
    Unconfigured(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone()),
            AppError::InvalidDomain(m) => (StatusCode::BAD_REQUEST, "invalid_domain", m.clone()),
            AppError::RateLimited { retry_after_secs } => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                format!("Too many requests; retry in {retry_after_secs}s"),
            ),
            AppError::Unconfigured(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unconfigured", m.clone())
            }
            AppError::Upstream(m) => (StatusCode::BAD_GATEWAY, "upstream_failure", m.clone()),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal server error".into(),
            ),
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        let mut response = (status, body).into_response();
        if let AppError::RateLimited { retry_after_secs } = self
            && let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string())
        {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

impl From<slotwise_core::busy::BusyError> for AppError {
    fn from(e: slotwise_core::busy::BusyError) -> Self {
        match e {
            slotwise_core::busy::BusyError::Unconfigured => {
                AppError::Unconfigured("no busy-interval feeds configured".into())
            }
            slotwise_core::busy::BusyError::Feed(msg) => AppError::Upstream(msg),
        }
    }
}

impl From<slotwise_core::contacts::ContactError> for AppError {
    fn from(e: slotwise_core::contacts::ContactError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl From<slotwise_core::verify::VerifyError> for AppError {
    fn from(e: slotwise_core::verify::VerifyError) -> Self {
        AppError::Upstream(e.to_string())
    }
}
