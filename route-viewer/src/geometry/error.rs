//! Routing engine error types.

use std::time::Duration;

/// Errors from fetching road geometry.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Engine returned an error status code
    #[error("routing engine error {status}")]
    Status { status: u16 },

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Engine answered but found no usable route
    #[error("no route found (code: {code})")]
    NoRoute { code: String },

    /// No answer within the fetch timeout
    #[error("routing engine timed out after {after:?}")]
    Timeout { after: Duration },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GeometryError::NoRoute {
            code: "NoSegment".into(),
        };
        assert_eq!(err.to_string(), "no route found (code: NoSegment)");

        let err = GeometryError::Timeout {
            after: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "routing engine timed out after 10s");

        let err = GeometryError::Timeout {
            after: Duration::from_millis(500),
        };
        assert_eq!(err.to_string(), "routing engine timed out after 500ms");

        let err = GeometryError::Status { status: 429 };
        assert_eq!(err.to_string(), "routing engine error 429");
    }
}
