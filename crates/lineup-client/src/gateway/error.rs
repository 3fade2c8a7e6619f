//! Error taxonomy for the remote query gateway.

use thiserror::Error;

/// A failed query. Shape problems in a successful response are not errors;
/// they surface as missing fields instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// No response was obtained (DNS, connect, timeout).
    #[error("API not reachable: {message}")]
    Connectivity { message: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Request { status: u16, body: String },
}

impl QueryError {
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
        }
    }

    pub fn request(status: u16, body: impl Into<String>) -> Self {
        Self::Request {
            status,
            body: body.into(),
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. })
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        QueryError::connectivity(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_displays_status_and_body() {
        let err = QueryError::request(404, r#"{"detail":"Team not found"}"#);
        assert_eq!(err.to_string(), r#"HTTP 404: {"detail":"Team not found"}"#);
        assert!(matches!(err, QueryError::Request { status: 404, .. }));
        assert!(!err.is_connectivity());
    }

    #[test]
    fn connectivity_error_has_no_status() {
        let err = QueryError::connectivity("connection refused");
        assert!(err.is_connectivity());
        assert!(err.to_string().starts_with("API not reachable"));
    }
}
