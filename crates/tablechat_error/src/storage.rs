//! Table storage error types.

/// Kinds of table storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Connection string is missing a required part or is malformed
    #[display("Invalid connection string: {}", _0)]
    ConnectionString(String),
    /// Request never reached the storage service
    #[display("Storage request failed: {}", _0)]
    Http(String),
    /// Storage service rejected the request (bad filter, auth, missing table)
    #[display("Storage service returned {}: {}", status, message)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or error message
        message: String,
    },
    /// Response body could not be decoded
    #[display("Failed to decode storage response: {}", _0)]
    Deserialization(String),
    /// Request signature could not be computed
    #[display("Failed to sign request: {}", _0)]
    Signing(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use tablechat_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::Api {
///     status: 400,
///     message: "InvalidInput".to_string(),
/// });
/// assert!(format!("{}", err).contains("InvalidInput"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
