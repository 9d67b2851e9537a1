//! Client error types

use smartmix_core::CoreError;
use thiserror::Error;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network, timeout or decoding failure
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Credential missing, invalid or expired
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

    /// The response envelope carried a failure code
    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session could not be read or updated
    #[error("Session error: {0}")]
    Session(#[from] CoreError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Create error from HTTP status code
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
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

    /// HTTP status carried by the failure, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::ServerError { status, .. } => Some(*status),
            Self::AuthenticationFailed(_) => Some(401),
            Self::NotFound(_) => Some(404),
            Self::BadRequest(_) => Some(400),
            Self::Forbidden(_) => Some(403),
            Self::Api { .. }
            | Self::Serialization(_)
            | Self::Session(_)
            | Self::Configuration(_) => None,
        }
    }

    /// Whether the server rejected the credential
    pub const fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_))
    }

    /// Whether the request ran past its deadline
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_classification() {
        let cases = [
            (StatusCode::BAD_REQUEST, Some(400)),
            (StatusCode::UNAUTHORIZED, Some(401)),
            (StatusCode::FORBIDDEN, Some(403)),
            (StatusCode::NOT_FOUND, Some(404)),
            (StatusCode::INTERNAL_SERVER_ERROR, Some(500)),
            (StatusCode::BAD_GATEWAY, Some(502)),
        ];

        for (status, expected) in cases {
            let err = ClientError::from_status(status, "boom".to_string());
            assert_eq!(err.status(), expected);
            assert_eq!(err.is_auth_expired(), status == StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_server_error_display() {
        let err = ClientError::from_status(StatusCode::SERVICE_UNAVAILABLE, "down".to_string());
        assert_eq!(err.to_string(), "Server error 503: down");
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_api_error_has_no_status() {
        let err = ClientError::Api {
            code: 400,
            message: "用户名已存在".to_string(),
        };
        assert_eq!(err.status(), None);
        assert!(!err.is_auth_expired());
    }
}
