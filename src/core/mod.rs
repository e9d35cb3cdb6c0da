//! Core module containing the query engine: branches, filters, alias
//! normalization, store traits and execution

pub mod branch;
pub mod error;
pub mod executor;
pub mod filter;
pub mod normalize;
pub mod query;
pub mod registry;
pub mod service;
pub mod store;

pub use branch::BranchId;
pub use error::{ErrorEnvelope, QueryError, QueryResult};
pub use executor::{OrderPage, QueryExecutor};
pub use filter::{DateRange, OrderFilter, build_filter};
pub use normalize::{GroupedRow, NormalizedItem, NormalizedOrder, group_items, normalize_order};
pub use query::{OrderQuery, PageRequest};
pub use registry::{ConnectionRegistry, DEFAULT_COLLECTION};
pub use service::OrderService;
pub use store::{BranchConnection, OrderStore};
