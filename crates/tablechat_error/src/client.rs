//! Error types for the client/orchestrator.

use derive_more::{Display, Error};

/// Specific error conditions for outbound calls made by the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum ClientErrorKind {
    /// Server unreachable or connection dropped.
    #[display("Connection error: {}", _0)]
    Transport(String),

    /// Server answered with a non-success status.
    #[display("Server returned {}: {}", status, body)]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// In-process language model backend failed.
    #[display("Generation failed: {}", _0)]
    Generation(String),

    /// Response body did not have the expected shape.
    #[display("Unexpected response: {}", _0)]
    Deserialization(String),
}

/// Client error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Client Error: {} at {}:{}", kind, file, line)]
pub struct ClientError {
    /// The specific error kind.
    pub kind: ClientErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// File where error occurred.
    pub file: &'static str,
}

impl ClientError {
    /// Creates a new error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ClientErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
