//! Error types for Vultr API operations.
//!
//! This module maps provider HTTP statuses onto a structured error taxonomy and
//! provides a serializable error response for callers that surface errors to
//! their own users.

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Main error type for Vultr API operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid client configuration (empty token, bad endpoint, ...)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Configuration failed field validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Endpoint URL could not be parsed
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Request rejected locally before any network traffic
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Identifier could not be coerced to the expected form
    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// HTTP 400, usually a wrong API path
    #[error("Invalid API location: {0}")]
    BadRequest(String),

    /// HTTP 403 or the bare `Invalid API key` body
    #[error("Invalid or missing API key: {0}")]
    AuthError(String),

    /// HTTP 405, verb does not match the endpoint
    #[error("Invalid HTTP method: {0}")]
    MethodNotAllowed(String),

    /// HTTP 412, carries the provider's detail message
    #[error("Request failed: {0}")]
    PreconditionFailed(String),

    /// HTTP 500
    #[error("Internal server error: {0}")]
    ServerError(String),

    /// HTTP 503, the provider allows about two requests per second
    #[error("Rate limit hit: {0}")]
    RateLimited(String),

    /// Any other non-success status
    #[error("Unexpected HTTP status {status}: {body}")]
    Unclassified {
        /// Raw HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Response body was not the expected JSON document
    #[error("Failed to decode response: {0}")]
    DecodeError(String),

    /// Expected field absent from an otherwise valid payload
    #[error("Missing field in response: {0}")]
    MissingField(String),

    /// Plan is not offered in the requested region
    #[error("Plan ID {plan} is not available in region {region}")]
    PlanUnavailable {
        /// VPS plan identifier
        plan: u64,
        /// Datacenter identifier
        region: u64,
    },

    /// HTTP transport failure
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Could not connect to the API host
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Specialized result type for Vultr operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error response for serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorDetail,
    /// Optional request ID for tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Error detail structure.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorDetail {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// HTTP status the error was classified from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::InvalidId(_) => "INVALID_ID",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::AuthError(_) => "AUTH_ERROR",
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::PreconditionFailed(_) => "PRECONDITION_FAILED",
            Self::ServerError(_) => "SERVER_ERROR",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Unclassified { .. } => "UNCLASSIFIED",
            Self::DecodeError(_) => "DECODE_ERROR",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::PlanUnavailable { .. } => "PLAN_UNAVAILABLE",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// HTTP status this error was classified from.
    ///
    /// `AuthError` reports 403 even when it came from the bare-string body,
    /// which the provider may send with other statuses.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthError(_) => Some(403),
            Self::MethodNotAllowed(_) => Some(405),
            Self::PreconditionFailed(_) => Some(412),
            Self::ServerError(_) => Some(500),
            Self::RateLimited(_) => Some(503),
            Self::Unclassified { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if repeating the same request later may succeed.
    ///
    /// The client never retries on its own; this only informs the caller's policy.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_)
                | Self::ServerError(_)
                | Self::Timeout(_)
                | Self::ServiceUnavailable(_)
        )
    }

    /// Converts the error into an `ErrorResponse`.
    #[must_use]
    pub fn into_error_response(self) -> ErrorResponse {
        self.into_error_response_with_id(None)
    }

    /// Converts the error into an `ErrorResponse` with a request ID.
    #[must_use]
    pub fn into_error_response_with_id(self, request_id: Option<String>) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
                status: self.status(),
            },
            request_id,
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::ConfigError(_) | Self::ServerError(_) | Self::DecodeError(_)
        )
    }
}

/// Map a non-success HTTP status to its error kind.
#[must_use]
pub fn map_status_to_error(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::BAD_REQUEST => {
            Error::BadRequest("check the URL that you are using".to_string())
        }
        StatusCode::FORBIDDEN => Error::AuthError(
            "check that your API key is present and matches your assigned key".to_string(),
        ),
        StatusCode::METHOD_NOT_ALLOWED => Error::MethodNotAllowed(
            "check that the method (POST|GET) matches what the documentation indicates"
                .to_string(),
        ),
        StatusCode::PRECONDITION_FAILED => Error::PreconditionFailed(body.trim().to_string()),
        StatusCode::INTERNAL_SERVER_ERROR => {
            Error::ServerError("try again at a later time".to_string())
        }
        StatusCode::SERVICE_UNAVAILABLE => Error::RateLimited(
            "API requests are limited to an average of 2/s, try again later".to_string(),
        ),
        other => Error::Unclassified {
            status: other.as_u16(),
            body: body.to_string(),
        },
    }
}

/// Classify a response status. Every 2xx status is success.
///
/// # Errors
///
/// Returns the mapped error for any non-2xx status.
pub fn check_status(status: StatusCode, body: &str) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(map_status_to_error(status, body))
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else if err.is_decode() {
            Self::DecodeError(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationError(err.to_string())
    }
}
