//! Error types and handling for the eloverblik client
//!
//! Only the fatal outcomes live here. Expected API conditions such as "data
//! not published yet" are carried in the `status` field of the result types
//! in [`crate::models`] instead.

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, EloverblikError>;

/// Main error type for the eloverblik client
#[derive(Debug, Error)]
pub enum EloverblikError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Malformed or unexpected API payloads
    #[error("API error: {message}")]
    Api { message: String },

    /// Token exchange failures
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Response shapes this client does not understand yet
    #[error("Not implemented: {message}")]
    Unsupported { message: String },
}

impl EloverblikError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        EloverblikError::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        EloverblikError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        EloverblikError::Serialization {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        EloverblikError::Io {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        EloverblikError::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        EloverblikError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        EloverblikError::Api {
            message: message.into(),
        }
    }

    /// Create a new auth error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        EloverblikError::Auth {
            message: message.into(),
        }
    }

    /// Create a new unsupported-shape error
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        EloverblikError::Unsupported {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for EloverblikError {
    fn from(err: std::io::Error) -> Self {
        EloverblikError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for EloverblikError {
    fn from(err: serde_yaml::Error) -> Self {
        EloverblikError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EloverblikError {
    fn from(err: serde_json::Error) -> Self {
        EloverblikError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for EloverblikError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EloverblikError::timeout(err.to_string())
        } else {
            EloverblikError::network(err.to_string())
        }
    }
}

impl From<chrono::ParseError> for EloverblikError {
    fn from(err: chrono::ParseError) -> Self {
        EloverblikError::validation("datetime", &err.to_string())
    }
}
