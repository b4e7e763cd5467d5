//! `queryTableEntities`

use super::{McpTool, args};
use crate::storage::{Entity, EntityQuery, TableStore, collect_entities};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tablechat_core::{ResultEnvelope, ToolName};
use tablechat_error::{ToolError, ToolErrorKind};
use tracing::{info, instrument};

/// Fetches up to [`args::MAX_TOP`] records with optional projection.
pub struct QueryEntitiesTool {
    store: Arc<dyn TableStore>,
    table: String,
}

impl QueryEntitiesTool {
    /// Query over `table` in `store`.
    pub fn new(store: Arc<dyn TableStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryReport<'a> {
    table: &'a str,
    filter: &'a str,
    top: usize,
    select: String,
    result_count: usize,
    entities: Vec<Entity>,
    timestamp: String,
}

#[async_trait]
impl McpTool for QueryEntitiesTool {
    fn name(&self) -> &str {
        "queryTableEntities"
    }

    fn description(&self) -> &str {
        "Fetch up to 100 entities from the table, optionally filtered and projected."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filter": {
                    "type": "string",
                    "description": "OData filter, e.g. country eq 'Japan'"
                },
                "top": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": args::MAX_TOP,
                    "description": "Maximum number of entities to return"
                },
                "select": {
                    "type": "string",
                    "description": "Comma-separated field names, e.g. City,Name"
                }
            },
            "additionalProperties": false
        })
    }

    #[instrument(skip(self, input), fields(tool = "queryTableEntities", table = %self.table))]
    async fn execute(&self, input: Map<String, Value>) -> Result<ResultEnvelope, ToolError> {
        args::reject_unknown(ToolName::QueryTableEntities, &input)?;
        let filter = args::parse_filter(&input)?;
        let limit = args::effective_limit(args::parse_top(&input)?);
        let select = args::effective_select(args::parse_select(&input)?.as_deref());

        let query = EntityQuery {
            filter: filter.clone(),
            select: select.clone(),
            top: None,
        };

        let mut conn = self.store.connect().await?;
        let result = collect_entities(conn.as_mut(), &query, limit).await;
        conn.close().await;
        let entities = result?;

        info!(filter = ?filter, top = limit, results = entities.len(), "Queried entities");

        let report = QueryReport {
            table: &self.table,
            filter: filter.as_deref().unwrap_or("none"),
            top: limit,
            select: select.map_or_else(|| "all".to_string(), |fields| fields.join(",")),
            result_count: entities.len(),
            entities,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| ToolError::new(ToolErrorKind::Serialization(e.to_string())))?;

        Ok(ResultEnvelope::text(text))
    }
}
