//! Request error taxonomy and the JSON error envelope
//!
//! Every failure of `/random/mean` becomes exactly one [`ApiError`], rendered
//! as `{"status": <int>, "message": <string>}` with the matching HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use randstat_core::types::AssembleError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("length value has to be more than 2")]
    Length,

    #[error("requests parameter value has to be more than 0")]
    Requests,

    #[error("requests parameter value has to be at most {max}")]
    TooManyRequests { max: usize },

    #[error("error parsing the request parameters")]
    Parse,
}

/// Missing provider credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no random.org API key was provided, check the app readme for proper configuration")]
    MissingCredential,
}

/// Classified failure of a single upstream call
///
/// `Display` is the caller-facing message; `detail` only goes to the logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExternalApiError {
    /// The call exceeded its timeout
    #[error("request timed out")]
    Timeout { detail: String },

    /// Connection, DNS or body failure, or an unusable success payload
    #[error("{message}")]
    Transport {
        message: &'static str,
        detail: String,
    },

    /// The provider answered with a non-success status or a JSON-RPC error
    #[error("failed to finish the request")]
    UpstreamStatus { status: u16, detail: String },
}

impl ExternalApiError {
    /// Message for connection-level failures
    pub const REQUEST_FAILED: &'static str = "failed to finish the request";
    /// Message for unusable success payloads
    pub const READ_FAILED: &'static str = "error reading data";

    /// Connection-level failure
    pub fn transport(detail: impl Into<String>) -> Self {
        Self::Transport {
            message: Self::REQUEST_FAILED,
            detail: detail.into(),
        }
    }

    /// Unusable success payload
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::Transport {
            message: Self::READ_FAILED,
            detail: detail.into(),
        }
    }

    /// Status code returned to the caller
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExternalApiError::Timeout { .. } => StatusCode::REQUEST_TIMEOUT,
            ExternalApiError::Transport { .. } | ExternalApiError::UpstreamStatus { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Diagnostic detail for logs
    pub fn detail(&self) -> &str {
        match self {
            ExternalApiError::Timeout { detail }
            | ExternalApiError::Transport { detail, .. }
            | ExternalApiError::UpstreamStatus { detail, .. } => detail,
        }
    }
}

/// Top-level error for one `/random/mean` request
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    External(#[from] ExternalApiError),

    /// Aggregation invariant violated, or a worker vanished
    #[error("internal error while aggregating results")]
    Internal(String),
}

impl From<AssembleError> for ApiError {
    fn from(err: AssembleError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ApiError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::External(e) => e.status_code(),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body for this error
    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status: self.status_code().as_u16(),
            message: self.to_string(),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Validation(_) | ApiError::Auth(_) => {
                tracing::info!(status = %self.status_code(), message = %self, "Request rejected");
            }
            ApiError::External(e) => {
                tracing::warn!(status = %self.status_code(), detail = %e.detail(), "Upstream failure");
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal aggregation error");
            }
        }

        (self.status_code(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use randstat_core::types::StatisticsError;

    #[test]
    fn test_validation_messages() {
        let err = ApiError::from(ValidationError::Length);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "length value has to be more than 2");

        let err = ApiError::from(ValidationError::Requests);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(ValidationError::Parse);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "error parsing the request parameters");
    }

    #[test]
    fn test_auth_status() {
        let err = ApiError::from(AuthError::MissingCredential);
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_external_classification() {
        let timeout = ExternalApiError::Timeout {
            detail: "deadline".to_string(),
        };
        assert_eq!(timeout.status_code(), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(timeout.to_string(), "request timed out");

        let transport = ExternalApiError::transport("connection refused");
        assert_eq!(transport.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(transport.to_string(), "failed to finish the request");
        assert_eq!(transport.detail(), "connection refused");

        let malformed = ExternalApiError::malformed("missing result");
        assert_eq!(malformed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(malformed.to_string(), "error reading data");

        let upstream = ExternalApiError::UpstreamStatus {
            status: 503,
            detail: "unavailable".to_string(),
        };
        assert_eq!(upstream.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream.to_string(), "failed to finish the request");
    }

    #[test]
    fn test_internal_from_assemble_error() {
        let err = ApiError::from(AssembleError::Statistics {
            index: 0,
            source: StatisticsError::EmptyInput,
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "internal error while aggregating results");
    }

    #[test]
    fn test_envelope() {
        let envelope = ApiError::from(ValidationError::Length).envelope();
        assert_eq!(
            envelope,
            ErrorEnvelope {
                status: 400,
                message: "length value has to be more than 2".to_string(),
            }
        );

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], 400);
    }
}
