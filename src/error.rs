//! Error types for the grid data source
//!
//! Fetch-path failures are always returned as values and handed to the
//! grid's failure channel; nothing on the fetch path panics.

use grid_types::NodeRequestError;
use thiserror::Error;

/// Failure of a single node fetch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Backend answered with a non-success HTTP status
    #[error("Request failed with HTTP {status}: {message}")]
    RequestFailed { status: u16, message: String },

    /// Backend answered successfully but the body is not JSON
    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    /// The request never produced an HTTP response (connect, TLS, body read)
    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Invalid node request: {0}")]
    InvalidRequest(#[from] NodeRequestError),

    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// Short machine-readable kind, used as a tracing field
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::RequestFailed { .. } => "request_failed",
            FetchError::MalformedResponse { .. } => "malformed_response",
            FetchError::Transport { .. } => "transport",
            FetchError::InvalidRequest(_) => "invalid_request",
            FetchError::InvalidUrl { .. } => "invalid_url",
        }
    }

    /// HTTP status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing configuration value '{key}'")]
    Missing { key: String },

    #[error("Invalid configuration value for '{field}': {reason}")]
    Invalid { field: String, reason: String },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("HTTP client construction failed: {message}")]
    HttpClient { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
