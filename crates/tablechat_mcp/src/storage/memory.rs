//! In-process table for local runs and tests.

use super::{Continuation, Entity, EntityPage, EntityQuery, TableConnection, TableStore};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tablechat_error::{StorageError, StorageErrorKind, ToolError};

/// A fixed set of records held in memory.
///
/// Understands conjunctions of string equality clauses
/// (`city eq 'Atlanta' and country eq 'USA'`); any other filter is rejected
/// the way the real service rejects malformed OData. Pages are cut at
/// `page_size` to exercise continuation handling.
#[derive(Debug, Clone)]
pub struct MemoryTableStore {
    entities: Arc<Vec<Entity>>,
    page_size: usize,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl MemoryTableStore {
    /// Create a store over `entities`.
    pub fn new(entities: Vec<Entity>) -> Self {
        Self {
            entities: Arc::new(entities),
            page_size: 1000,
            opened: Arc::new(AtomicUsize::new(0)),
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Cap every page at `page_size` records.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Connections opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Connections released so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn connect(&self) -> Result<Box<dyn TableConnection>, ToolError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            store: self.clone(),
        }))
    }
}

struct MemoryConnection {
    store: MemoryTableStore,
}

#[async_trait]
impl TableConnection for MemoryConnection {
    async fn query_page(
        &mut self,
        query: &EntityQuery,
        continuation: Option<&Continuation>,
    ) -> Result<EntityPage, StorageError> {
        let clauses = match &query.filter {
            Some(filter) => parse_filter(filter)?,
            None => Vec::new(),
        };

        let start = match continuation {
            Some(next) => next.next_partition_key.parse::<usize>().map_err(|_| {
                StorageError::new(StorageErrorKind::Api {
                    status: 400,
                    message: format!("Bad continuation token: {}", next.next_partition_key),
                })
            })?,
            None => 0,
        };
        let page_size = query
            .top
            .map_or(self.store.page_size, |top| top.min(self.store.page_size));

        let mut entities = Vec::new();
        let mut position = start;
        while position < self.store.entities.len() && entities.len() < page_size {
            let entity = &self.store.entities[position];
            position += 1;
            if clauses.iter().all(|(field, value)| matches(entity, field, value)) {
                entities.push(project(entity, query.select.as_deref()));
            }
        }

        let continuation = (position < self.store.entities.len()).then(|| Continuation {
            next_partition_key: position.to_string(),
            next_row_key: None,
        });

        Ok(EntityPage {
            entities,
            continuation,
        })
    }

    async fn close(self: Box<Self>) {
        self.store.closed.fetch_add(1, Ordering::SeqCst);
    }
}

fn parse_filter(filter: &str) -> Result<Vec<(String, String)>, StorageError> {
    filter
        .split(" and ")
        .map(|clause| {
            let (field, value) = clause.trim().split_once(" eq ").ok_or_else(|| unsupported(filter))?;
            let value = value
                .trim()
                .strip_prefix('\'')
                .and_then(|v| v.strip_suffix('\''))
                .ok_or_else(|| unsupported(filter))?;
            Ok((field.trim().to_string(), value.to_string()))
        })
        .collect()
}

fn unsupported(filter: &str) -> StorageError {
    StorageError::new(StorageErrorKind::Api {
        status: 400,
        message: format!("InvalidInput: One of the request inputs is not valid. Filter: {}", filter),
    })
}

fn matches(entity: &Entity, field: &str, value: &str) -> bool {
    entity.get(field).and_then(Value::as_str) == Some(value)
}

fn project(entity: &Entity, select: Option<&[String]>) -> Entity {
    match select {
        Some(fields) => fields
            .iter()
            .filter_map(|field| entity.get(field).map(|v| (field.clone(), v.clone())))
            .collect(),
        None => entity.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(row_key: &str, city: &str) -> Entity {
        match json!({"PartitionKey": "p", "RowKey": row_key, "city": city, "Name": row_key}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_pages_follow_continuation() {
        let store = MemoryTableStore::new(vec![
            entity("1", "Atlanta"),
            entity("2", "Tokyo"),
            entity("3", "Atlanta"),
        ])
        .with_page_size(2);
        let mut conn = store.connect().await.unwrap();

        let first = conn.query_page(&EntityQuery::default(), None).await.unwrap();
        assert_eq!(first.entities.len(), 2);
        let next = first.continuation.expect("more pages");

        let second = conn
            .query_page(&EntityQuery::default(), Some(&next))
            .await
            .unwrap();
        assert_eq!(second.entities.len(), 1);
        assert!(second.continuation.is_none());
    }

    #[test]
    fn test_parse_filter_conjunction() {
        let clauses = parse_filter("city eq 'Atlanta' and country eq 'USA'").unwrap();
        assert_eq!(
            clauses,
            vec![
                ("city".to_string(), "Atlanta".to_string()),
                ("country".to_string(), "USA".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_filter_rejects_garbage() {
        assert!(parse_filter("city == Atlanta").is_err());
    }
}
