//! Error types for the blog API client.
//!
//! # Design
//! Every failure the client can produce is an `ApiError`, and its `Display`
//! output is always the normalized, human-readable message and nothing else.
//! The variants only record where the failure came from, so callers that
//! care can tell a dead network apart from a backend rejection while callers
//! that just show a message can use `to_string()`.

use thiserror::Error;

/// Generic message for a success response whose body is not JSON.
pub(crate) const INVALID_JSON_MESSAGE: &str = "invalid JSON in response body";

/// Generic message for a JSON body that does not match the expected shape.
pub(crate) const UNEXPECTED_SHAPE_MESSAGE: &str = "unexpected response shape";

/// The single error type returned by the request pipeline and every endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, DNS, TLS, timeout).
    #[error("{message}")]
    Transport { message: String },

    /// The backend answered with a non-2xx status, or with a 2xx whose body
    /// is not JSON.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// A JSON success body did not match the expected shape.
    #[error("{message}")]
    Decode { message: String },

    /// The request payload could not be serialized to JSON.
    #[error("{message}")]
    Serialization { message: String },
}

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            ApiError::Transport { message }
            | ApiError::Backend { message, .. }
            | ApiError::Decode { message }
            | ApiError::Serialization { message } => message,
        }
    }

    /// HTTP status of a backend failure; `None` for every other kind.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Failure reported by a `Transport` when no response was received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport { message: err.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        let err = ApiError::Backend {
            status: 400,
            message: "Category has existing posts".to_string(),
        };
        assert_eq!(err.to_string(), "Category has existing posts");
        assert_eq!(err.message(), "Category has existing posts");
    }

    #[test]
    fn status_only_for_backend_failures() {
        let backend = ApiError::Backend {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert_eq!(backend.status(), Some(404));
        assert!(backend.is_not_found());

        let transport: ApiError = TransportError("connection refused".to_string()).into();
        assert_eq!(transport.status(), None);
        assert!(!transport.is_not_found());
        assert_eq!(transport.to_string(), "connection refused");
    }
}
