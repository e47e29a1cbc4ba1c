//! Error types for the gym_core library.
//!
//! Two families live here. [`Error`] covers local failures (config, files,
//! client construction). [`RemoteError`] and [`AuthError`] are what the
//! collaborators hand back to the screens, already split into "the server told
//! us why" and "anything else".

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for gym_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Session store error
    #[error("Session error: {0}")]
    Session(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Failure of a call made through a [`Transport`](crate::transport::Transport).
///
/// `Domain` carries a message the server produced for the end user and is safe
/// to display verbatim. `Transport` carries diagnostic text only and must never
/// reach the user.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("{message}")]
    Domain { message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl RemoteError {
    pub fn domain(message: impl Into<String>) -> Self {
        RemoteError::Domain {
            message: message.into(),
        }
    }

    pub fn transport(detail: impl Into<String>) -> Self {
        RemoteError::Transport(detail.into())
    }

    /// The user-safe message, if the server classified this failure
    pub fn domain_message(&self) -> Option<&str> {
        match self {
            RemoteError::Domain { message } => Some(message),
            RemoteError::Transport(_) => None,
        }
    }
}

/// Failure while establishing a session
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Sign-in succeeded remotely but the session could not be persisted
    #[error("failed to persist session: {0}")]
    Storage(#[from] Error),
}

impl AuthError {
    pub fn domain_message(&self) -> Option<&str> {
        match self {
            AuthError::Remote(e) => e.domain_message(),
            AuthError::Storage(_) => None,
        }
    }
}
