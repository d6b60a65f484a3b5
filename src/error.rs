//! Error types and handling infrastructure for aimbridge.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! custom error types. The binary layers `anyhow` on top for context.
//!
//! Errors raised while talking to the host are never fatal to the frame loop:
//! the arbiter and bridge catch them at the call site, log them through the
//! rate limiter, and treat the call as having had no effect this frame.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for aimbridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A host object (ability manager, avatar, camera...) is not available right now
    #[error("Host object unavailable: {what}")]
    HostUnavailable { what: String },

    /// Invoking a host callback or accessor failed
    #[error("Host call `{call}` failed: {message}")]
    HostCallFailed { call: String, message: String },

    /// Reading a config or scenario file failed
    #[error("File operation failed: {message}")]
    FileError {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// File not found specifically (common case for user feedback)
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// TOML payload could not be parsed or did not match the expected shape
    #[error("Failed to parse {what}: {source}")]
    ParseError {
        what: String,
        #[source]
        source: toml::de::Error,
    },

    /// Configuration related errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Replay scenario is internally inconsistent
    #[error("Scenario error: {message}")]
    ScenarioError { message: String },
}

/// Standard Result type for aimbridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// Create a FileError from an io::Error with additional context
    pub fn file_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::FileError {
            message: message.into(),
            source,
        }
    }

    /// A host object is missing this frame
    pub fn unavailable(what: impl Into<String>) -> Self {
        Self::HostUnavailable { what: what.into() }
    }

    /// A host call threw or returned an unusable value
    pub fn host_call(call: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HostCallFailed {
            call: call.into(),
            message: message.into(),
        }
    }

    /// Wrap a TOML deserialization failure
    pub fn parse(what: impl Into<String>, source: toml::de::Error) -> Self {
        Self::ParseError {
            what: what.into(),
            source,
        }
    }

    /// Create a ConfigError with a descriptive message
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a ScenarioError with a descriptive message
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::ScenarioError {
            message: message.into(),
        }
    }

    /// True for errors that come from the host boundary rather than from local files.
    pub fn is_host_error(&self) -> bool {
        matches!(
            self,
            Self::HostUnavailable { .. } | Self::HostCallFailed { .. }
        )
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::FileError {
                message: "File not found".to_string(),
                source: err,
            },
            std::io::ErrorKind::PermissionDenied => Self::FileError {
                message: "Permission denied".to_string(),
                source: err,
            },
            _ => Self::FileError {
                message: "IO operation failed".to_string(),
                source: err,
            },
        }
    }
}
