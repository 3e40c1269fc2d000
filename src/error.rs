//! Error types and handling for the SolarEdge client and relay
//!
//! Every failure of the API client is returned to the caller as a
//! [`SolarEdgeError`]. The relay recovers from them by logging and keeping
//! its previous snapshot; the one-shot commands treat them as fatal.

use thiserror::Error;

/// Result type alias for SolarEdge operations
pub type Result<T> = std::result::Result<T, SolarEdgeError>;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum SolarEdgeError {
    /// Configuration-related errors (unknown time zone, missing key, ...)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Connect/DNS/TLS failures talking to the monitoring API
    #[error("Network error: {message}")]
    Network { message: String },

    /// The per-request timeout elapsed before the API answered
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// The API answered with a non-2xx status
    #[error("HTTP error: status {status} - {message}")]
    Http { status: u16, message: String },

    /// Malformed JSON or an unexpected envelope shape
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Serialization of configuration files
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },
}

impl SolarEdgeError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a new upstream status error
    pub fn http<S: Into<String>>(status: u16, message: S) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create a new decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        Self::Web {
            message: message.into(),
        }
    }

    /// Upstream status code, if this error came from a non-2xx response
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// 4xx from the API: bad key, unknown site, quota exceeded
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// 5xx from the API
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }
}

impl From<std::io::Error> for SolarEdgeError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SolarEdgeError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SolarEdgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

impl From<reqwest::Error> for SolarEdgeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<chrono::ParseError> for SolarEdgeError {
    fn from(err: chrono::ParseError) -> Self {
        Self::Validation {
            field: "datetime".to_string(),
            message: err.to_string(),
        }
    }
}
