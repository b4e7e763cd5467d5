//! Error types for tool execution.

use crate::{ConfigError, StorageError};

/// Specific error conditions for tool execution.
#[derive(Debug, Clone, derive_more::Display)]
pub enum ToolErrorKind {
    /// No tool registered under the requested name
    #[display("Tool \"{}\" not found.", _0)]
    ToolNotFound(String),

    /// Arguments do not match the tool's schema
    #[display("Invalid tool arguments: {}", _0)]
    InvalidArguments(String),

    /// Storage backend failed
    #[display("{}", _0.kind)]
    Storage(StorageError),

    /// Storage credential missing or unusable
    #[display("{}", _0.message)]
    Config(ConfigError),

    /// Result could not be rendered
    #[display("Serialization error: {}", _0)]
    Serialization(String),
}

/// Tool execution error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Tool Error: {} at line {} in {}", kind, line, file)]
pub struct ToolError {
    /// The specific error kind.
    pub kind: ToolErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// File where error occurred.
    pub file: &'static str,
}

impl ToolError {
    /// Creates a new error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ToolErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Returns true if the caller is at fault (unknown tool or bad arguments).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind,
            ToolErrorKind::ToolNotFound(_) | ToolErrorKind::InvalidArguments(_)
        )
    }
}

impl From<StorageError> for ToolError {
    #[track_caller]
    fn from(err: StorageError) -> Self {
        Self::new(ToolErrorKind::Storage(err))
    }
}

impl From<ConfigError> for ToolError {
    #[track_caller]
    fn from(err: ConfigError) -> Self {
        Self::new(ToolErrorKind::Config(err))
    }
}
