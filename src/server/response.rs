//! Success envelopes for the order endpoints

use crate::core::executor::OrderPage;
use crate::core::normalize::GroupedRow;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

/// Paginated order listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPageEnvelope {
    pub success: bool,
    pub branch: String,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,

    /// Wall-clock time spent on the request, e.g. `"12ms"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_time: Option<String>,

    pub items: Vec<Value>,
}

impl OrderPageEnvelope {
    pub fn new(branch: impl Into<String>, page: OrderPage, elapsed: Option<Duration>) -> Self {
        Self {
            success: true,
            branch: branch.into(),
            total: page.total,
            page: page.page,
            page_size: page.page_size,
            total_pages: page.total_pages,
            query_time: elapsed.map(|d| format!("{}ms", d.as_millis())),
            items: page.items,
        }
    }
}

/// Grouped line-item report
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedEnvelope {
    pub success: bool,
    pub branch: String,
    pub total_items: usize,
    pub items: Vec<GroupedRow>,
}

impl GroupedEnvelope {
    pub fn new(branch: impl Into<String>, items: Vec<GroupedRow>) -> Self {
        Self {
            success: true,
            branch: branch.into(),
            total_items: items.len(),
            items,
        }
    }
}
