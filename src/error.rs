//! Error types for the Known Agents middleware.
//!
//! Configuration and validation errors fail activation synchronously. API
//! errors are either surfaced by provisioning (robots.txt fetch) or only
//! logged (visit reporting).

use thiserror::Error;

/// A syntax or semantic error found while reading a configuration block.
///
/// The `Display` form is `<file>:<line>: <message>` so hosts can print it
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}:{line}: {message}")]
pub struct ConfigError {
    /// Name of the configuration source (file path or `"Testfile"`).
    pub file: String,
    /// 1-based line of the offending token (0 when no token was read).
    pub line: usize,
    pub message: String,
}

/// Activation-time validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing access token")]
    MissingAccessToken,

    #[error("missing agent type filters")]
    MissingAgentTypes,

    #[error("unrecognized agent type '{0}'")]
    UnrecognizedAgentType(String),
}

/// Failure talking to the Known Agents API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection, TLS, timeout or body read failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("unexpected status {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    /// Payload could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure while activating a module instance.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("failed to fetch generated robots.txt: {0}")]
    RobotsTxt(#[source] ApiError),
}

/// Failure registering or dispatching host modules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),

    #[error("directive '{0}' is already registered")]
    DuplicateDirective(String),

    #[error("unrecognized directive '{0}'")]
    UnknownDirective(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
