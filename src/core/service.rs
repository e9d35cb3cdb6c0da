//! Request orchestration for the order endpoints
//!
//! Validation runs in a fixed order (branch, filter, pagination) and always
//! completes before any store is touched.

use crate::core::error::QueryResult;
use crate::core::executor::{OrderPage, QueryExecutor};
use crate::core::filter::build_filter;
use crate::core::normalize::GroupedRow;
use crate::core::query::{DEFAULT_PAGE_SIZE, OrderQuery};
use crate::core::registry::ConnectionRegistry;
use std::sync::Arc;

/// Branch-routed order queries
#[derive(Clone)]
pub struct OrderService {
    executor: QueryExecutor,
    default_page_size: u64,
}

impl OrderService {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            executor: QueryExecutor::new(registry),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used when a request has no `limit`
    pub fn with_default_page_size(mut self, page_size: u64) -> Self {
        self.default_page_size = page_size;
        self
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        self.executor.registry()
    }

    /// List one page of a branch's orders
    pub async fn list_orders(&self, branch: &str, query: &OrderQuery) -> QueryResult<OrderPage> {
        let branch_id = self.registry().parse_branch(branch)?;
        let filter = build_filter(query)?;
        let page = query.page_request(self.default_page_size)?;

        tracing::info!(
            branch = %branch_id,
            filter = ?filter,
            page = page.page(),
            limit = page.page_size(),
            "orders requested"
        );

        let result = self.executor.fetch_page(branch_id, &filter, page).await?;

        tracing::info!(
            branch = %branch_id,
            returned = result.items.len(),
            total = result.total,
            "orders fetched"
        );
        Ok(result)
    }

    /// Grouped line-item report for a branch
    pub async fn grouped_items(
        &self,
        branch: &str,
        query: &OrderQuery,
    ) -> QueryResult<Vec<GroupedRow>> {
        let branch_id = self.registry().parse_branch(branch)?;
        let filter = build_filter(query)?;

        tracing::info!(branch = %branch_id, filter = ?filter, "grouped items requested");

        let rows = self.executor.group_items(branch_id, &filter).await?;

        tracing::info!(branch = %branch_id, groups = rows.len(), "grouped items computed");
        Ok(rows)
    }
}
