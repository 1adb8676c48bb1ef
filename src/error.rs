//! Error types and handling for pwdash
//!
//! This module defines the error types used throughout the crate. A failed
//! gateway request is always a [`DashError::Fetch`], whatever the cause
//! (transport, HTTP status or body).

use thiserror::Error;

/// Result type alias for pwdash operations
pub type Result<T> = std::result::Result<T, DashError>;

/// Main error type for pwdash
#[derive(Debug, Error)]
pub enum DashError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Network-related errors outside of a gateway fetch
    #[error("Network error: {message}")]
    Network { message: String },

    /// A gateway endpoint could not be fetched or decoded
    #[error("Fetch error on {endpoint}: {message}")]
    Fetch { endpoint: String, message: String },

    /// Timer could not be scheduled
    #[error("Scheduler error: {message}")]
    Scheduler { message: String },

    /// HTTP server errors
    #[error("Web server error: {message}")]
    Web { message: String },
}

impl DashError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        DashError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        DashError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        DashError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        DashError::Network {
            message: message.into(),
        }
    }

    /// Create a new fetch error for the given endpoint path
    pub fn fetch<E: Into<String>, S: Into<String>>(endpoint: E, message: S) -> Self {
        DashError::Fetch {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a new scheduler error
    pub fn scheduler<S: Into<String>>(message: S) -> Self {
        DashError::Scheduler {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        DashError::Web {
            message: message.into(),
        }
    }

    /// Whether this error came from a gateway fetch
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, DashError::Fetch { .. })
    }
}

impl From<std::io::Error> for DashError {
    fn from(err: std::io::Error) -> Self {
        DashError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for DashError {
    fn from(err: serde_yaml::Error) -> Self {
        DashError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for DashError {
    fn from(err: serde_json::Error) -> Self {
        DashError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for DashError {
    fn from(err: reqwest::Error) -> Self {
        DashError::network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DashError::config("test config error");
        assert!(matches!(err, DashError::Config { .. }));

        let err = DashError::fetch("/soc", "status 502");
        assert!(err.is_fetch_failure());

        let err = DashError::validation("field", "test validation error");
        assert!(matches!(err, DashError::Validation { .. }));
        assert!(!err.is_fetch_failure());
    }

    #[test]
    fn test_error_display() {
        let err = DashError::config("test error");
        assert_eq!(format!("{}", err), "Configuration error: test error");

        let err = DashError::validation("test_field", "invalid value");
        assert_eq!(
            format!("{}", err),
            "Validation error: test_field - invalid value"
        );

        let err = DashError::fetch("/aggregates", "status 503 Service Unavailable");
        assert_eq!(
            format!("{}", err),
            "Fetch error on /aggregates: status 503 Service Unavailable"
        );
    }
}
