//! HTTP surface of the order router
//!
//! This module provides a `ServerBuilder` that registers:
//! - Health check routes
//! - The paginated order listing and grouped report per branch

pub mod builder;
pub mod handlers;
pub mod response;
pub mod router;

#[cfg(feature = "mongodb_backend")]
pub use builder::connect_registry;
#[cfg(feature = "in-memory")]
pub use builder::in_memory_registry;
pub use builder::ServerBuilder;
pub use handlers::AppState;
pub use response::{GroupedEnvelope, OrderPageEnvelope};
