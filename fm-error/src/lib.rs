//! Unified error handling for Filament Manager
//!
//! This crate provides the single error type shared by the accounting engine,
//! the wire protocol and the command line front-end.

use std::io;
use std::path::PathBuf;

/// Result type alias using FilamentError
pub type Result<T> = std::result::Result<T, FilamentError>;

/// Unified error type for all Filament Manager operations
#[derive(thiserror::Error, Debug)]
pub enum FilamentError {
    // ============================================================================
    // Accounting Errors
    // ============================================================================
    #[error("Tool index {tool} out of range (printer has {tool_count} tools)")]
    OutOfRange {
        tool: usize,
        tool_count: usize,
    },

    // ============================================================================
    // Validation Errors
    // ============================================================================
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid spool: {0}")]
    InvalidSpool(String),

    #[error("Invalid value for setting {field}: {reason}")]
    InvalidSetting {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Backend Errors
    // ============================================================================
    #[error("Backend request failed: {0}")]
    Backend(String),

    #[error("Unexpected backend response: {0}")]
    BackendResponse(String),

    // ============================================================================
    // I/O and Configuration Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl FilamentError {
    /// Create a generic error from a string
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an out-of-range error for a tool index
    pub fn out_of_range(tool: usize, tool_count: usize) -> Self {
        Self::OutOfRange { tool, tool_count }
    }

    /// Create an invalid setting error
    pub fn invalid_setting(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a backend error from a string
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// True for errors caused by the caller addressing a tool that does not exist
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }
}

// Allow converting from String to FilamentError
impl From<String> for FilamentError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to FilamentError
impl From<&str> for FilamentError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = FilamentError::out_of_range(5, 2);
        assert!(err.is_out_of_range());
        assert_eq!(err.to_string(), "Tool index 5 out of range (printer has 2 tools)");
    }

    #[test]
    fn test_from_str() {
        let err: FilamentError = "boom".into();
        assert!(matches!(err, FilamentError::Generic(ref m) if m == "boom"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: FilamentError = parse_err.into();
        assert!(err.to_string().starts_with("Failed to parse JSON"));
    }
}
