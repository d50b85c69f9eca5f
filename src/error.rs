//! Error types for composer-layer
//!
//! All modules use `ComposerResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for composer-layer operations
pub type ComposerResult<T> = Result<T, ComposerError>;

/// All errors that can occur while detecting or building
#[derive(Error, Debug)]
pub enum ComposerError {
    // Detect
    #[error("{0}")]
    DetectFailed(String),

    // Input errors
    #[error("Invalid build plan at {path}: {reason}")]
    PlanInvalid { path: PathBuf, reason: String },

    #[error("Failed to parse {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    // Process errors
    #[error("Failed to start command: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' {}", exit_description(.code))]
    ToolExit { command: String, code: Option<i32> },

    // Layer errors
    #[error("Cannot publish {path}: a real directory is already present")]
    PublishConflict { path: PathBuf },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

impl ComposerError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Exit code of a tool that ran to completion with a non-zero status
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ToolExit { code, .. } => *code,
            _ => None,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandFailed { .. } => {
                Some("Make sure `composer` and `php` are on PATH (provided by earlier buildpacks)")
            }
            Self::PublishConflict { .. } => {
                Some("Remove the vendor directory from the app source or let the build adopt it")
            }
            Self::PlanInvalid { .. } => Some("Check the [[entries]] tables of the buildpack plan"),
            _ => None,
        }
    }
}
