//! Error types for the tablechat workspace.
//!
//! This crate provides the error types shared by the inference gateway, the
//! tool execution server and the client/orchestrator.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use tablechat_error::{TablechatResult, ConfigError};
//!
//! fn load() -> TablechatResult<String> {
//!     Err(ConfigError::new("AZURE_STORAGE_CONNECTION_STRING not set"))?
//! }
//!
//! assert!(load().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod gateway;
mod storage;
mod tool;

pub use client::{ClientError, ClientErrorKind};
pub use config::ConfigError;
pub use error::{TablechatError, TablechatErrorKind, TablechatResult};
pub use gateway::{GatewayError, GatewayErrorKind};
pub use storage::{StorageError, StorageErrorKind};
pub use tool::{ToolError, ToolErrorKind};
