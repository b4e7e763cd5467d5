//! Top-level error wrapper types.

use crate::{ClientError, ConfigError, GatewayError, StorageError, ToolError};

/// Every error the workspace can produce.
///
/// # Examples
///
/// ```
/// use tablechat_error::{TablechatError, ConfigError};
///
/// let err: TablechatError = ConfigError::new("missing port").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TablechatErrorKind {
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Inference gateway error
    #[from(GatewayError)]
    Gateway(GatewayError),
    /// Tool execution error
    #[from(ToolError)]
    Tool(ToolError),
    /// Table storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Client/orchestrator error
    #[from(ClientError)]
    Client(ClientError),
}

/// Tablechat error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tablechat Error: {}", _0)]
pub struct TablechatError(Box<TablechatErrorKind>);

impl TablechatError {
    /// Create a new error from a kind.
    pub fn new(kind: TablechatErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TablechatErrorKind {
        &self.0
    }
}

impl<T> From<T> for TablechatError
where
    T: Into<TablechatErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for tablechat operations.
pub type TablechatResult<T> = std::result::Result<T, TablechatError>;
