//! Error handling for the pet adoption client

use std::fmt;
use thiserror::Error;

use crate::fetch::RemoteError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse error category, used by callers deciding how to present a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Authentication,
    Forbidden,
    Remote,
    PartialFailure,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Authentication => "AUTHENTICATION",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Remote => "REMOTE",
            ErrorKind::PartialFailure => "PARTIAL_FAILURE",
            ErrorKind::Internal => "INTERNAL",
        };
        write!(f, "{}", s)
    }
}

/// Unified error type for the pet adoption client
#[derive(Error, Debug)]
pub enum Error {
    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input, detected before any remote mutation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A business rule forbids the operation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The record is not in a state that allows the transition
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Credentials did not match any account
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The acting session lacks the required role
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A backend call failed
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A workflow step failed after earlier steps had already been committed
    #[error(
        "{workflow} partially applied (completed: {}); step `{failed_step}` failed: {source}",
        .completed.join(", ")
    )]
    PartialFailure {
        workflow: &'static str,
        completed: Vec<&'static str>,
        failed_step: &'static str,
        source: Box<Error>,
    },

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    pub fn conflict<T: fmt::Display>(msg: T) -> Self {
        Error::Conflict(msg.to_string())
    }

    pub fn invalid_state<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidState(msg.to_string())
    }

    pub fn forbidden<T: fmt::Display>(msg: T) -> Self {
        Error::Forbidden(msg.to_string())
    }

    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Conflict(_) | Error::InvalidState(_) => ErrorKind::Conflict,
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::Forbidden(_) => ErrorKind::Forbidden,
            Error::Remote(_) => ErrorKind::Remote,
            Error::PartialFailure { .. } => ErrorKind::PartialFailure,
            Error::Config(_) | Error::Json(_) | Error::Url(_) | Error::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Whether the error was raised before any remote mutation took place.
    pub fn is_side_effect_free(&self) -> bool {
        !matches!(self, Error::PartialFailure { .. })
    }

    /// Postgres error code reported by the backend, if any
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Error::Remote(remote) => remote.code(),
            _ => None,
        }
    }

    /// Message suitable for showing to an end user.
    ///
    /// Business-rule and validation messages are passed through verbatim;
    /// backend failures are reduced to a generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound(msg)
            | Error::Validation(msg)
            | Error::Conflict(msg)
            | Error::InvalidState(msg)
            | Error::Authentication(msg)
            | Error::Forbidden(msg) => msg.clone(),
            Error::Remote(_) => "The server could not complete the request. Try again.".to_string(),
            Error::PartialFailure {
                completed,
                failed_step,
                ..
            } => format!(
                "The operation stopped at `{}` after completing: {}.",
                failed_step,
                completed.join(", ")
            ),
            Error::Config(_) | Error::Json(_) | Error::Url(_) | Error::Io(_) => {
                "Unexpected internal error.".to_string()
            }
        }
    }
}
