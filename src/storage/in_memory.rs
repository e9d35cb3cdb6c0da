//! In-memory branch backend for testing and development
//!
//! Orders are kept as raw JSON documents, so fixtures can reproduce the
//! same schema drift found in real branches. Filtering, ordering and
//! grouping are evaluated in process with the same semantics as the
//! MongoDB backend.

use crate::core::error::{QueryError, QueryResult};
use crate::core::filter::OrderFilter;
use crate::core::normalize::{GroupedRow, TIMESTAMP, group_items, timestamp_value};
use crate::core::query::PageRequest;
use crate::core::registry::DEFAULT_COLLECTION;
use crate::core::store::{BranchConnection, OrderStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, RwLock};

type Collections = Arc<RwLock<HashMap<String, Vec<Value>>>>;

/// In-memory branch connection
///
/// Cloning shares the underlying data. Uses RwLock for thread-safe access.
/// Availability can be switched off to simulate a lost partition.
#[derive(Clone)]
pub struct InMemoryBranch {
    collections: Collections,
    available: Arc<AtomicBool>,
}

impl InMemoryBranch {
    /// Create a new, reachable, empty branch
    pub fn new() -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Create a branch seeded with orders in the default collection
    pub fn with_orders(orders: impl IntoIterator<Item = Value>) -> Self {
        let branch = Self::new();
        for order in orders {
            branch.insert(order);
        }
        branch
    }

    /// Append an order to the default collection
    pub fn insert(&self, order: Value) {
        self.insert_into(DEFAULT_COLLECTION, order);
    }

    /// Append an order to a named collection
    pub fn insert_into(&self, collection: &str, order: Value) {
        let mut collections = match self.collections.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        collections
            .entry(collection.to_string())
            .or_default()
            .push(order);
    }

    /// Mark the branch reachable or unreachable
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }
}

impl Default for InMemoryBranch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BranchConnection for InMemoryBranch {
    async fn bind_orders(&self, collection: &str) -> QueryResult<Arc<dyn OrderStore>> {
        if !self.available.load(AtomicOrdering::SeqCst) {
            return Err(unavailable());
        }
        Ok(Arc::new(InMemoryOrderStore {
            collections: self.collections.clone(),
            available: self.available.clone(),
            collection: collection.to_string(),
        }))
    }

    fn backend(&self) -> &'static str {
        "in-memory"
    }
}

fn unavailable() -> QueryError {
    QueryError::PartitionUnavailable {
        message: "in-memory branch is marked unavailable".to_string(),
    }
}

/// Order accessor bound to one in-memory collection
pub struct InMemoryOrderStore {
    collections: Collections,
    available: Arc<AtomicBool>,
    collection: String,
}

impl InMemoryOrderStore {
    /// Snapshot of the documents matching `filter`, in insertion order
    fn matching(&self, filter: &OrderFilter) -> QueryResult<Vec<Value>> {
        if !self.available.load(AtomicOrdering::SeqCst) {
            return Err(unavailable());
        }
        let collections = self
            .collections
            .read()
            .map_err(|e| QueryError::Internal {
                message: format!("Failed to acquire read lock: {}", e),
            })?;

        Ok(collections
            .get(&self.collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default())
    }
}

/// Sort key: one timestamp per alias field, in sort-priority order
fn sort_key(doc: &Value) -> Vec<Option<DateTime<Utc>>> {
    TIMESTAMP
        .aliases
        .iter()
        .map(|field| doc.get(field).and_then(timestamp_value))
        .collect()
}

/// Newest first; documents missing a field sort after those that have it
fn newest_first(a: &Value, b: &Value) -> Ordering {
    sort_key(b).cmp(&sort_key(a))
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find(&self, filter: &OrderFilter, page: &PageRequest) -> QueryResult<Vec<Value>> {
        let mut docs = self.matching(filter)?;
        docs.sort_by(newest_first);

        let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.page_size()).unwrap_or(usize::MAX);
        Ok(docs.into_iter().skip(skip).take(take).collect())
    }

    async fn count(&self, filter: &OrderFilter) -> QueryResult<u64> {
        Ok(self.matching(filter)?.len() as u64)
    }

    async fn aggregate_grouped(&self, filter: &OrderFilter) -> QueryResult<Vec<GroupedRow>> {
        let docs = self.matching(filter)?;
        group_items(docs.iter())
    }
}
