//! Centralized error types for filemailer.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the filemailer library.
#[derive(Error, Debug)]
pub enum FileMailerError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing the archive failed inside the ZIP encoder.
    #[error("Archive error for '{path}': {reason}")]
    Archive { path: PathBuf, reason: String },

    /// The named template does not exist under the template root.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// The template failed to render (syntax error or unresolved variable).
    #[error("Failed to render template '{name}': {reason}")]
    Template { name: String, reason: String },

    /// A recipient or sender address could not be parsed.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The outbound message could not be assembled.
    #[error("Failed to build message: {0}")]
    MessageBuild(String),

    /// The mail transport rejected or failed to deliver the message.
    #[error("Mail transport error: {0}")]
    Transport(String),

    /// Configuration could not be read or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A base64 payload could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Convenience alias for `Result<T, FileMailerError>`.
pub type Result<T> = std::result::Result<T, FileMailerError>;

/// Coarse classification of a [`FileMailerError`], reported to callers of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    FileSystem,
    Archive,
    Template,
    Transport,
    Configuration,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::FileSystem => "filesystem",
            Self::Archive => "archive",
            Self::Template => "template",
            Self::Transport => "transport",
            Self::Configuration => "configuration",
        };
        f.write_str(s)
    }
}

impl FileMailerError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an `Archive` variant from a path and any displayable cause.
    pub fn archive(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Archive {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::FileSystem,
            Self::Archive { .. } => ErrorKind::Archive,
            Self::TemplateNotFound(_) | Self::Template { .. } => ErrorKind::Template,
            Self::InvalidAddress(_) | Self::MessageBuild(_) | Self::Transport(_) => {
                ErrorKind::Transport
            }
            Self::Config(_) | Self::Decode(_) => ErrorKind::Configuration,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (rare; prefer `FileMailerError::io`).
impl From<std::io::Error> for FileMailerError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}
