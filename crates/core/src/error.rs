//! Error types for objstore-core
//!
//! Callers can tell apart "the input was invalid" (`InvalidMethod`,
//! `InvalidPath`, `InvalidContainerName`, `InvalidMetadata`) from "the remote call failed"
//! (`Transport`, `MalformedResponse`).

use thiserror::Error;

use crate::transport::TransportError;

/// Result type alias for objstore-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the signer, the reconciler and the service facade
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP verb not accepted for temporary URLs
    #[error("Invalid method for temporary URL: {0} (expected GET, PUT, HEAD, POST or DELETE)")]
    InvalidMethod(String),

    /// Resource path does not contain the API version segment
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Container name is empty or contains a path separator
    #[error("Invalid container name: '{0}'")]
    InvalidContainerName(String),

    /// Metadata key or value cannot be carried in an HTTP header
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// The remote call failed; carried unchanged from the transport
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response is missing the expected metadata structure
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when the remote service answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_not_found())
    }

    /// True when the error was caused by caller input rather than the service
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::InvalidMethod(_)
                | Error::InvalidPath(_)
                | Error::InvalidContainerName(_)
                | Error::InvalidMetadata(_)
        )
    }
}
