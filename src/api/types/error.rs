//! API error type returned as `{ "error": "<message>" }`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Error body shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: message.into(),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Billing gate: merchant has no credits left
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn message(&self) -> &str {
        &self.response.error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::NotFound { message } => Self::not_found(message),
            DomainError::Validation { message } => Self::bad_request(message),
            DomainError::InsufficientCredits { message } => Self::forbidden(message),
            DomainError::RateLimited { message } => Self::rate_limited(message),
            DomainError::PayloadTooLarge { message } => Self::payload_too_large(message),
            DomainError::Provider { .. } | DomainError::Timeout { .. } => {
                Self::internal(err.public_message())
            }
            DomainError::Uninitialized { .. } => Self::internal("System not initialized"),
            DomainError::Storage { .. }
            | DomainError::Configuration { .. }
            | DomainError::Internal { .. } => {
                tracing::error!(error = %err, "Unexpected error handling request");
                Self::internal("Internal server error")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status.as_u16(), self.response.error)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_error_mapping() {
        let cases = [
            (DomainError::not_found("Merchant profile not found"), StatusCode::NOT_FOUND),
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::insufficient_credits("no credits"), StatusCode::FORBIDDEN),
            (DomainError::rate_limited("slow down"), StatusCode::TOO_MANY_REQUESTS),
            (DomainError::payload_too_large("too big"), StatusCode::PAYLOAD_TOO_LARGE),
            (DomainError::uninitialized("no merchants"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::timeout("Generation timed out"), StatusCode::INTERNAL_SERVER_ERROR),
            (DomainError::storage("down"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (domain, status) in cases {
            assert_eq!(ApiError::from(domain).status, status);
        }
    }

    #[test]
    fn test_provider_message_is_surfaced_without_prefix() {
        let err = ApiError::from(DomainError::provider("kie", "internal"));
        assert_eq!(err.message(), "internal");
    }

    #[test]
    fn test_infrastructure_details_are_hidden() {
        let err = ApiError::from(DomainError::storage("connection refused to 10.0.0.3"));
        assert_eq!(err.message(), "Internal server error");
    }

    #[test]
    fn test_error_serialization() {
        let err = ApiError::rate_limited("Daily limit reached");
        let json = serde_json::to_string(&err.response).unwrap();

        assert_eq!(json, r#"{"error":"Daily limit reached"}"#);
    }
}
