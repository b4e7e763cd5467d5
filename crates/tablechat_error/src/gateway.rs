//! Error types for the inference gateway.

/// Error kinds for gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum GatewayErrorKind {
    /// The inference engine failed to produce output
    #[display("Inference engine failed: {}", _0)]
    Engine(String),

    /// HTTP request to the engine failed
    #[display("HTTP request failed: {}", _0)]
    Http(String),

    /// Token stream broke mid-generation
    #[display("Stream error: {}", _0)]
    Stream(String),

    /// Engine response could not be decoded
    #[display("Failed to deserialize response: {}", _0)]
    Deserialization(String),

    /// Caller sent a malformed generation request
    #[display("Invalid request: {}", _0)]
    InvalidRequest(String),

    /// Engine process could not be started or never became ready
    #[display("Engine start failed: {}", _0)]
    ServerStartFailed(String),

    /// Engine process could not be stopped
    #[display("Engine stop failed: {}", _0)]
    ServerStopFailed(String),
}

/// Gateway error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Gateway Error: {} at line {} in {}", kind, line, file)]
pub struct GatewayError {
    /// The error kind
    pub kind: GatewayErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl GatewayError {
    /// Create a new GatewayError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GatewayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Returns true if the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self.kind, GatewayErrorKind::InvalidRequest(_))
    }
}
