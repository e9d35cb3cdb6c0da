//! Query executor
//!
//! Runs a built [`OrderFilter`] against one branch: either a paginated fetch
//! (page of documents plus total count, issued concurrently) or a grouped
//! line-item aggregation.

use crate::core::branch::BranchId;
use crate::core::error::QueryResult;
use crate::core::filter::OrderFilter;
use crate::core::normalize::GroupedRow;
use crate::core::query::PageRequest;
use crate::core::registry::ConnectionRegistry;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One page of orders with pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub items: Vec<Value>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// Executes filters against branch stores
#[derive(Clone)]
pub struct QueryExecutor {
    registry: Arc<ConnectionRegistry>,
}

impl QueryExecutor {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Fetch one page of matching orders and the total match count
    ///
    /// The fetch and the count run concurrently and are not guaranteed to
    /// observe the same snapshot.
    pub async fn fetch_page(
        &self,
        branch: BranchId,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> QueryResult<OrderPage> {
        let store = self.registry.resolve_collection(branch).await?;
        filter.check()?;

        let (items, total) = tokio::try_join!(store.find(filter, &page), store.count(filter))?;

        Ok(OrderPage {
            items,
            total,
            page: page.page(),
            page_size: page.page_size(),
            total_pages: page.total_pages(total),
        })
    }

    /// Group line items of all matching orders by item name
    pub async fn group_items(
        &self,
        branch: BranchId,
        filter: &OrderFilter,
    ) -> QueryResult<Vec<GroupedRow>> {
        let store = self.registry.resolve_collection(branch).await?;
        filter.check()?;
        store.aggregate_grouped(filter).await
    }
}

#[cfg(all(test, feature = "in-memory"))]
mod tests {
    use super::*;
    use crate::core::error::QueryError;
    use crate::core::filter::DateRange;
    use crate::core::normalize::parse_datetime;
    use crate::storage::InMemoryBranch;
    use serde_json::json;

    fn executor_with(branch: InMemoryBranch) -> QueryExecutor {
        let registry = ConnectionRegistry::new()
            .with_branch(BranchId::new(1), branch, "globalorders")
            .unwrap();
        QueryExecutor::new(Arc::new(registry))
    }

    fn seeded(count: usize) -> InMemoryBranch {
        let branch = InMemoryBranch::new();
        for day in 1..=count {
            branch.insert(json!({
                "createdAt": format!("2024-01-{:02}T12:00:00Z", day),
                "status": "paid",
                "items": [{"name": "Tea", "quantity": 1, "price": 5}]
            }));
        }
        branch
    }

    #[tokio::test]
    async fn test_fetch_first_page() {
        let executor = executor_with(seeded(25));
        let page = executor
            .fetch_page(
                BranchId::new(1),
                &OrderFilter::default(),
                PageRequest::new(1, 10).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0]["createdAt"], "2024-01-25T12:00:00Z");
        assert_eq!(page.items[9]["createdAt"], "2024-01-16T12:00:00Z");
    }

    #[tokio::test]
    async fn test_fetch_last_partial_page() {
        let executor = executor_with(seeded(25));
        let page = executor
            .fetch_page(
                BranchId::new(1),
                &OrderFilter::default(),
                PageRequest::new(3, 10).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(page.items.len(), 5);
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 10);
    }

    #[tokio::test]
    async fn test_malformed_filter_is_invalid_query() {
        let executor = executor_with(seeded(1));
        let filter = OrderFilter {
            date_range: Some(DateRange {
                start: parse_datetime("2024-02-01").unwrap(),
                end: parse_datetime("2024-01-01").unwrap(),
            }),
            ..Default::default()
        };
        let err = executor
            .group_items(BranchId::new(1), &filter)
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidQuery { .. }));
    }

    #[tokio::test]
    async fn test_unavailable_partition_propagates() {
        let branch = seeded(3);
        branch.set_available(false);
        let executor = executor_with(branch);

        let err = executor
            .fetch_page(
                BranchId::new(1),
                &OrderFilter::default(),
                PageRequest::new(1, 10).unwrap(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DB_CONNECTION_ERROR");

        let err = executor
            .group_items(BranchId::new(1), &OrderFilter::default())
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DB_CONNECTION_ERROR");
    }

    #[tokio::test]
    async fn test_group_items_through_store() {
        let executor = executor_with(seeded(4));
        let rows = executor
            .group_items(BranchId::new(1), &OrderFilter::default())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].quantity, 4.0);
        assert_eq!(rows[0].subtotal, 20.0);
    }
}
