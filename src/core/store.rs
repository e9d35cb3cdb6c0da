//! Store-access traits implemented by each storage backend

use crate::core::error::QueryResult;
use crate::core::filter::OrderFilter;
use crate::core::normalize::GroupedRow;
use crate::core::query::PageRequest;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Read-only access to one branch's order collection
///
/// Implementations receive an already validated [`OrderFilter`] and report
/// failures with the engine taxonomy: connectivity problems as
/// `PartitionUnavailable`, rejected predicates as `InvalidQuery`, rejected
/// grouping pipelines as `AggregationFailure`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch one page of matching orders, newest first
    ///
    /// Ordering is by `createdAt` descending, ties broken by `order_date`
    /// descending. Documents are returned as stored.
    async fn find(&self, filter: &OrderFilter, page: &PageRequest) -> QueryResult<Vec<Value>>;

    /// Count all orders matching the filter
    async fn count(&self, filter: &OrderFilter) -> QueryResult<u64>;

    /// Flatten and group line items of all matching orders by item name
    ///
    /// Rows are sorted by summed quantity descending, then by item name.
    async fn aggregate_grouped(&self, filter: &OrderFilter) -> QueryResult<Vec<GroupedRow>>;
}

/// A live connection to one branch
///
/// Connections are established at process start. Binding produces the typed
/// accessor for a named collection and is performed at most once per branch
/// by the registry.
#[async_trait]
pub trait BranchConnection: Send + Sync {
    /// Bind the order accessor for `collection`
    async fn bind_orders(&self, collection: &str) -> QueryResult<Arc<dyn OrderStore>>;

    /// Backend name used in logs
    fn backend(&self) -> &'static str;
}
