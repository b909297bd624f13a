//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error; no response was received
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The session could not be renewed after a 401
    #[error("Session refresh rejected ({status}): {message}")]
    RefreshRejected { status: u16, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// Status code of the response that produced this error, if there was one
    pub fn status(&self) -> Option<StatusCode> {
        let code = match self {
            Self::BadRequest(_) => 400,
            Self::AuthenticationFailed(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::ServerError { status, .. } | Self::RefreshRejected { status, .. } => *status,
            Self::Request(err) => return err.status(),
            Self::Serialization(_) | Self::Configuration(_) => return None,
        };
        StatusCode::from_u16(code).ok()
    }

    /// Raw response body carried by a status error
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::BadRequest(message)
            | Self::AuthenticationFailed(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::ServerError { message, .. }
            | Self::RefreshRejected { message, .. } => Some(message),
            Self::Request(_) | Self::Serialization(_) | Self::Configuration(_) => None,
        }
    }

    /// Response body parsed as JSON, when it is JSON
    pub fn payload(&self) -> Option<serde_json::Value> {
        self.body().and_then(|body| serde_json::from_str(body).ok())
    }

    /// True when the caller should consider the user signed out
    pub const fn is_auth_expired(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed(_) | Self::RefreshRejected { .. }
        )
    }

    /// True when the request never produced a response
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}
