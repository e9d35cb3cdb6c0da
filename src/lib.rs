//! # Order Router
//!
//! A read-only query and aggregation engine over order data that is
//! partitioned by branch. Each branch lives in its own store, and its
//! documents do not agree on field names: a timestamp may be `createdAt` or
//! `order_date`, line items may be `items` or `ordered_items`, and so on.
//!
//! ## Features
//!
//! - **Branch routing**: requests name a branch; each branch's collection is
//!   bound once, on first use
//! - **Schema drift tolerance**: field aliases are resolved in one place
//! - **Filtering**: inclusive date ranges and status / payment method sets
//! - **Pagination**: strict `page` / `limit` validation with page metadata
//! - **Grouped report**: per-item quantity and revenue totals
//! - **Typed errors**: stable error codes and HTTP status classes
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use order_router::prelude::*;
//!
//! let registry = ConnectionRegistry::new()
//!     .with_branch(BranchId::new(1), InMemoryBranch::new(), DEFAULT_COLLECTION)?;
//!
//! ServerBuilder::new()
//!     .with_registry(registry)
//!     .serve("127.0.0.1:3000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        BranchConnection, BranchId, ConnectionRegistry, DEFAULT_COLLECTION, GroupedRow,
        OrderFilter, OrderPage, OrderQuery, OrderService, OrderStore, PageRequest, QueryError,
        QueryResult,
    };

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryBranch;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoBranch;

    // === Config ===
    pub use crate::config::{AppConfig, BranchConfig, Environment};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use serde_json::Value;
}
