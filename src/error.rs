//! Error types for certgate

use std::io;

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for certgate
pub type Result<T> = std::result::Result<T, Error>;

/// Certgate errors
///
/// Every failure in the dispatch pipeline is converted into exactly one of
/// these variants at the point of detection and surfaced to the caller as a
/// terminal response. There is no local recovery or retry: backend issuance
/// calls are not guaranteed idempotent.
#[derive(Error, Debug)]
pub enum Error {
    /// Unknown or missing dispatch target
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Payload is not valid structured data for the operation
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Embedded signing request fails base64 decoding
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Decoded bytes do not parse as a well-formed signing request
    #[error("Invalid signing request: {0}")]
    InvalidSigningRequest(String),

    /// Policy store unreachable or zone unknown
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// Request violates the resolved zone policy
    #[error("{0}")]
    PolicyViolation(String),

    /// Backend invocation failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// Backend result cannot be serialized for the caller
    #[error("Response encoding error: {0}")]
    ResponseEncoding(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// HTTP status the caller sees for this error.
    ///
    /// One mapping table applied uniformly regardless of which component
    /// produced the failure, so callers get a consistent shape for all
    /// error kinds.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedOperation(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::MalformedPayload(_)
            | Self::InvalidEncoding(_)
            | Self::InvalidSigningRequest(_)
            | Self::ResponseEncoding(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DependencyUnavailable(_) => StatusCode::FAILED_DEPENDENCY,
            Self::PolicyViolation(_) => StatusCode::FORBIDDEN,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
