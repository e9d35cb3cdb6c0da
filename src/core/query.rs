//! Request options and pagination

use crate::core::error::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};

/// Largest accepted page size
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Page size used when the caller does not send `limit`
pub const DEFAULT_PAGE_SIZE: u64 = 200;

/// Recognized query-string options for order endpoints
///
/// Every option arrives as an optional raw string and is parsed explicitly
/// by the filter builder or by [`OrderQuery::page_request`]. Unknown options
/// are ignored.
///
/// # Example
/// ```text
/// GET /branch/1/orders?startDate=2024-01-01&endDate=2024-01-31&status=paid,done&page=2&limit=50
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderQuery {
    /// Inclusive lower bound on the order timestamp
    pub start_date: Option<String>,

    /// Inclusive upper bound on the order timestamp
    pub end_date: Option<String>,

    /// Comma-separated status codes
    pub status: Option<String>,

    /// Comma-separated payment methods
    pub payment_method: Option<String>,

    /// Page number (starts at 1)
    pub page: Option<String>,

    /// Number of orders per page
    pub limit: Option<String>,
}

impl OrderQuery {
    /// Parse and validate `page` / `limit`
    ///
    /// Out-of-range values are rejected, never clamped.
    pub fn page_request(&self, default_page_size: u64) -> QueryResult<PageRequest> {
        let page = parse_number("page", self.page.as_deref())?.unwrap_or(1);
        let page_size = parse_number("limit", self.limit.as_deref())?.unwrap_or(default_page_size);
        PageRequest::new(page, page_size)
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> QueryResult<Option<u64>> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| QueryError::InvalidPagination {
            message: format!("{} must be a positive integer, got '{}'", name, raw),
        })
}

/// A validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u64,
    page_size: u64,
}

impl PageRequest {
    /// Create a page window, rejecting `page < 1`, `page_size` outside
    /// `[1, 1000]`, and pages whose offset does not fit a signed 64-bit skip
    pub fn new(page: u64, page_size: u64) -> QueryResult<Self> {
        if page < 1 {
            return Err(QueryError::InvalidPagination {
                message: format!("page must be >= 1, got {}", page),
            });
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(QueryError::InvalidPagination {
                message: format!(
                    "limit must be between 1 and {}, got {}",
                    MAX_PAGE_SIZE, page_size
                ),
            });
        }
        let offset = (page - 1)
            .checked_mul(page_size)
            .filter(|skip| i64::try_from(*skip).is_ok());
        if offset.is_none() {
            return Err(QueryError::InvalidPagination {
                message: format!("page {} is out of range for limit {}", page, page_size),
            });
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Number of documents to skip
    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.page_size
    }

    /// Total number of pages for `total` matching documents
    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }
}
