//! Connection registry for branch partitions
//!
//! The registry is built once at startup with one live connection per
//! branch and then shared (behind an `Arc`) by every request. The typed
//! order accessor for a branch is bound lazily on first use and cached; a
//! `tokio::sync::OnceCell` per branch guarantees that concurrent first
//! requests bind exactly once and all observe the same handle.

use crate::core::branch::BranchId;
use crate::core::error::{QueryError, QueryResult};
use crate::core::store::{BranchConnection, OrderStore};
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Collection holding orders on every branch unless configured otherwise
pub const DEFAULT_COLLECTION: &str = "globalorders";

struct BranchSlot {
    connection: Arc<dyn BranchConnection>,
    collection: String,
    orders: OnceCell<Arc<dyn OrderStore>>,
}

/// Registry of branch connections keyed by branch id
#[derive(Default)]
pub struct ConnectionRegistry {
    branches: BTreeMap<BranchId, BranchSlot>,
}

impl ConnectionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            branches: BTreeMap::new(),
        }
    }

    /// Register a branch connection
    ///
    /// Fails if the branch id is already registered.
    pub fn register(
        &mut self,
        id: BranchId,
        connection: Arc<dyn BranchConnection>,
        collection: impl Into<String>,
    ) -> Result<()> {
        if self.branches.contains_key(&id) {
            return Err(anyhow!("Branch {} is already registered", id));
        }
        self.branches.insert(
            id,
            BranchSlot {
                connection,
                collection: collection.into(),
                orders: OnceCell::new(),
            },
        );
        Ok(())
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with_branch(
        mut self,
        id: BranchId,
        connection: impl BranchConnection + 'static,
        collection: impl Into<String>,
    ) -> Result<Self> {
        self.register(id, Arc::new(connection), collection)?;
        Ok(self)
    }

    /// All registered branch ids, ascending
    pub fn branch_ids(&self) -> Vec<BranchId> {
        self.branches.keys().copied().collect()
    }

    /// Check whether a branch id is registered
    pub fn contains(&self, id: BranchId) -> bool {
        self.branches.contains_key(&id)
    }

    /// Parse a raw branch identifier and check it is registered
    pub fn parse_branch(&self, raw: &str) -> QueryResult<BranchId> {
        let id: BranchId = raw.parse()?;
        if self.contains(id) {
            Ok(id)
        } else {
            Err(QueryError::InvalidBranch {
                branch: raw.to_string(),
            })
        }
    }

    /// Resolve the order accessor for a branch, binding it on first use
    pub async fn resolve_collection(&self, id: BranchId) -> QueryResult<Arc<dyn OrderStore>> {
        let slot = self
            .branches
            .get(&id)
            .ok_or_else(|| QueryError::InvalidBranch {
                branch: id.to_string(),
            })?;

        let orders = slot
            .orders
            .get_or_try_init(|| async {
                tracing::debug!(
                    branch = %id,
                    backend = slot.connection.backend(),
                    collection = %slot.collection,
                    "binding order collection"
                );
                slot.connection.bind_orders(&slot.collection).await
            })
            .await?;

        Ok(orders.clone())
    }

    /// Whether the accessor for a branch has already been bound
    pub fn is_bound(&self, id: BranchId) -> bool {
        self.branches
            .get(&id)
            .is_some_and(|slot| slot.orders.initialized())
    }
}
