//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a backend call
///
/// Every variant is cheap to clone so one refresh outcome can be handed to
/// all callers waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// No response reached the client
    #[error("Network failure: {message}")]
    Network { message: String },

    /// The session is not (or no longer) authorized; log in again
    #[error("Authentication failed: {message}")]
    Auth { status: Option<u16>, message: String },

    /// The backend rejected the request (4xx other than 401)
    #[error("Request rejected ({status}): {message}")]
    Validation { status: u16, message: String },

    /// The backend failed (5xx or any other unexpected status)
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Response body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: StatusCode, message: String) -> Self {
        let status = status.as_u16();
        match status {
            401 => Self::Auth {
                status: Some(status),
                message,
            },
            400..=499 => Self::Validation { status, message },
            _ => Self::Server { status, message },
        }
    }

    /// Session expired or credentials rejected
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::Auth {
            status: Some(StatusCode::UNAUTHORIZED.as_u16()),
            message: message.into(),
        }
    }

    /// HTTP status carried by this failure, if a response was received
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } => *status,
            Self::Validation { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::Network { .. } | Self::Decode(_) | Self::Configuration(_) => None,
        }
    }

    /// Whether the caller should tear down the session and re-login
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::Configuration(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
