//! Error types for toolbridge.

use thiserror::Error;

/// Main error type for toolbridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// One or more required settings are absent
    #[error("{service} is not configured: missing {}", keys.join(", "))]
    MissingConfig {
        service: &'static str,
        keys: Vec<&'static str>,
    },

    /// A setting is present but unusable
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(String),

    /// Backend answered with a non-2xx status
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Stream body carried no usable `data:` frame
    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    /// Response did not follow the expected JSON-RPC contract
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller supplied arguments the tool cannot act on
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Action name outside what the target device supports
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Tool name outside the supported set
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl Error {
    /// Stable machine-oriented tag for this error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::MissingConfig { .. } | Error::Config(_) => "config",
            Error::Http(_) => "http",
            Error::Api { .. } => "api",
            Error::MalformedStream(_) => "malformed_stream",
            Error::Protocol(_) => "protocol",
            Error::Serialization(_) => "serialization",
            Error::InvalidInput(_) | Error::InvalidAction(_) => "invalid_input",
            Error::UnknownTool(_) => "unknown_tool",
        }
    }

    /// Diagnostic string placed in the envelope `error` field.
    pub fn diagnostic(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

/// Result type alias for toolbridge operations.
pub type Result<T> = std::result::Result<T, Error>;
