//! Table storage seam and implementations.

mod azure;
mod memory;

pub use azure::{AzureTableStore, ConnectionString};
pub use memory::MemoryTableStore;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tablechat_error::{StorageError, ToolError};
use tracing::{debug, instrument};

/// A single table record: field name to value.
pub type Entity = Map<String, Value>;

/// Largest page the storage service hands out in one response.
const MAX_PAGE_SIZE: usize = 1000;

/// Opaque resume point returned with a partial page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continuation {
    /// Partition key to resume from
    pub next_partition_key: String,
    /// Row key to resume from, if the service returned one
    pub next_row_key: Option<String>,
}

/// One page request against the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityQuery {
    /// OData filter; `None` matches every record
    pub filter: Option<String>,
    /// Server-side projection; `None` returns every field
    pub select: Option<Vec<String>>,
    /// Page size hint
    pub top: Option<usize>,
}

/// One page of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityPage {
    /// Records in this page
    pub entities: Vec<Entity>,
    /// Set when more records remain
    pub continuation: Option<Continuation>,
}

/// Factory for per-request connections.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Open a connection scoped to one tool call.
    ///
    /// Fails when the store has no usable credential.
    async fn connect(&self) -> Result<Box<dyn TableConnection>, ToolError>;
}

/// A live connection to the table.
#[async_trait]
pub trait TableConnection: Send {
    /// Fetch one page of matching records.
    async fn query_page(
        &mut self,
        query: &EntityQuery,
        continuation: Option<&Continuation>,
    ) -> Result<EntityPage, StorageError>;

    /// Release the connection.
    async fn close(self: Box<Self>);
}

/// Count every record matching `filter`, following continuations to the end.
#[instrument(skip(conn))]
pub async fn count_entities(
    conn: &mut dyn TableConnection,
    filter: Option<&str>,
) -> Result<usize, StorageError> {
    let query = EntityQuery {
        filter: filter.map(str::to_string),
        select: Some(vec!["RowKey".to_string()]),
        top: Some(MAX_PAGE_SIZE),
    };

    let mut count = 0;
    let mut continuation = None;
    loop {
        let page = conn.query_page(&query, continuation.as_ref()).await?;
        count += page.entities.len();
        debug!(page = page.entities.len(), total = count, "Counted page");

        match page.continuation {
            Some(next) => continuation = Some(next),
            None => break,
        }
    }

    Ok(count)
}

/// Collect matching records, stopping once `limit` have been gathered.
#[instrument(skip(conn, query), fields(filter = ?query.filter))]
pub async fn collect_entities(
    conn: &mut dyn TableConnection,
    query: &EntityQuery,
    limit: usize,
) -> Result<Vec<Entity>, StorageError> {
    let mut results: Vec<Entity> = Vec::with_capacity(limit.min(MAX_PAGE_SIZE));
    let mut continuation = None;

    while results.len() < limit {
        let page_query = EntityQuery {
            top: Some((limit - results.len()).min(MAX_PAGE_SIZE)),
            ..query.clone()
        };
        let page = conn.query_page(&page_query, continuation.as_ref()).await?;

        let remaining = limit - results.len();
        results.extend(page.entities.into_iter().take(remaining));
        debug!(collected = results.len(), limit, "Collected page");

        match page.continuation {
            Some(next) => continuation = Some(next),
            None => break,
        }
    }

    Ok(results)
}
