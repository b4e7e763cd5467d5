//! Tool implementations for the tool execution server.

pub mod args;
mod count;
mod query;

pub use count::CountEntitiesTool;
pub use query::QueryEntitiesTool;

use crate::storage::TableStore;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tablechat_core::ResultEnvelope;
use tablechat_error::{ToolError, ToolErrorKind};

/// Trait for tools callable over `/mcp`.
#[async_trait]
pub trait McpTool: Send + Sync {
    /// Returns the wire name.
    fn name(&self) -> &str;

    /// Returns the tool description for the LLM.
    fn description(&self) -> &str;

    /// Returns the input schema as JSON Schema.
    fn input_schema(&self) -> Value;

    /// Executes the tool with the given arguments.
    async fn execute(&self, input: Map<String, Value>) -> Result<ResultEnvelope, ToolError>;
}

/// Registry for managing tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn McpTool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the count and query tools over one shared store.
    pub fn with_table_tools(store: Arc<dyn TableStore>, table: impl Into<String>) -> Self {
        let table = table.into();
        let mut registry = Self::new();
        registry.register(Arc::new(CountEntitiesTool::new(store.clone(), table.clone())));
        registry.register(Arc::new(QueryEntitiesTool::new(store, table)));
        registry
    }

    /// Registers a tool.
    pub fn register(&mut self, tool: Arc<dyn McpTool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Gets a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn McpTool>> {
        self.tools.get(name).cloned()
    }

    /// Lists all registered tools.
    pub fn list(&self) -> Vec<Arc<dyn McpTool>> {
        self.tools.values().cloned().collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Executes a tool by name.
    pub async fn execute(
        &self,
        name: &str,
        input: Map<String, Value>,
    ) -> Result<ResultEnvelope, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::new(ToolErrorKind::ToolNotFound(name.to_string())))?;

        tool.execute(input).await
    }
}
