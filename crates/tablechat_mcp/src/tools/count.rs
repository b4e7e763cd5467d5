//! `countTableEntities`

use super::{McpTool, args};
use crate::storage::{TableStore, count_entities};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tablechat_core::{ResultEnvelope, ToolName};
use tablechat_error::ToolError;
use tracing::{info, instrument};

/// Counts records matching an optional OData filter.
pub struct CountEntitiesTool {
    store: Arc<dyn TableStore>,
    table: String,
}

impl CountEntitiesTool {
    /// Count over `table` in `store`.
    pub fn new(store: Arc<dyn TableStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }
}

#[async_trait]
impl McpTool for CountEntitiesTool {
    fn name(&self) -> &str {
        "countTableEntities"
    }

    fn description(&self) -> &str {
        "Count the entities in the table, optionally restricted by an OData filter."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filter": {
                    "type": "string",
                    "description": "OData filter, e.g. city eq 'Atlanta'"
                }
            },
            "additionalProperties": false
        })
    }

    #[instrument(skip(self, input), fields(tool = "countTableEntities", table = %self.table))]
    async fn execute(&self, input: Map<String, Value>) -> Result<ResultEnvelope, ToolError> {
        args::reject_unknown(ToolName::CountTableEntities, &input)?;
        let filter = args::parse_filter(&input)?;

        let mut conn = self.store.connect().await?;
        let result = count_entities(conn.as_mut(), filter.as_deref()).await;
        conn.close().await;
        let count = result?;

        info!(filter = ?filter, count, "Counted entities");
        Ok(ResultEnvelope::text(format!(
            "The Azure Table \"{}\" contains {} entities matching filter: \"{}\".",
            self.table,
            count,
            filter.as_deref().unwrap_or("none")
        )))
    }
}
