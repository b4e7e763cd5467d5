//! Tool execution server for tablechat.
//!
//! Exposes two fixed tools over a single HTTP endpoint (`POST /mcp`):
//!
//! - **`countTableEntities`**: count records matching an OData filter
//! - **`queryTableEntities`**: fetch up to 100 records, with optional projection
//!
//! Both tools read from one Azure Table Storage table through the
//! [`TableStore`] seam. A fresh connection is opened per call and released
//! when the call finishes, whether it succeeded or not.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use tablechat_mcp::{AzureTableStore, McpState, ToolRegistry, create_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(AzureTableStore::from_env("mainData"));
//!     let registry = ToolRegistry::with_table_tools(store, "mainData");
//!     let app = create_router(McpState::new(registry));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3333").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod storage;
pub mod tools;

pub use api::{McpRequest, McpState, create_router};
pub use storage::{
    AzureTableStore, ConnectionString, Continuation, Entity, EntityPage, EntityQuery,
    MemoryTableStore, TableConnection, TableStore, collect_entities, count_entities,
};
pub use tools::{CountEntitiesTool, McpTool, QueryEntitiesTool, ToolRegistry};
