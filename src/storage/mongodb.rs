//! MongoDB branch backend using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! order-router = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! Each branch is its own deployment (one `mongodb::Client` per branch)
//! holding an order collection, `globalorders` by default. Documents are
//! read as untyped BSON and handed back as relaxed extended JSON; the
//! engine never writes.
//!
//! # Query translation
//!
//! Filters become plain `find` predicates (`$or` over the timestamp aliases,
//! `$in` for memberships). The grouped report runs as an aggregation
//! pipeline whose `$ifNull` chains are generated from the alias table in
//! [`crate::core::normalize`].

use crate::core::error::{QueryError, QueryResult};
use crate::core::filter::OrderFilter;
use crate::core::normalize::{
    AliasRule, DEFAULT_CATEGORY, GroupedRow, ITEM_CATEGORY, ITEM_LIST, ITEM_NAME, ITEM_PRICE,
    ITEM_QUANTITY, PAYMENT_METHOD_FIELD, STATUS_FIELD, TIMESTAMP,
};
use crate::core::query::PageRequest;
use crate::core::store::{BranchConnection, OrderStore};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, DateTime as BsonDateTime, Document, doc};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::{Client, Collection};
use serde_json::Value;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a BSON Document into a serde_json::Value (relaxed extended JSON).
fn document_to_json(doc: Document) -> Value {
    Bson::Document(doc).into_relaxed_extjson()
}

/// Translate an [`OrderFilter`] into a `find` predicate.
pub fn filter_document(filter: &OrderFilter) -> Document {
    let mut query = Document::new();

    if let Some(range) = &filter.date_range {
        let bounds = doc! {
            "$gte": BsonDateTime::from_millis(range.start.timestamp_millis()),
            "$lte": BsonDateTime::from_millis(range.end.timestamp_millis()),
        };
        let clauses: Vec<Document> = TIMESTAMP
            .aliases
            .iter()
            .map(|field| {
                let mut clause = Document::new();
                clause.insert(*field, bounds.clone());
                clause
            })
            .collect();
        query.insert("$or", clauses);
    }

    if let Some(statuses) = &filter.statuses {
        query.insert(STATUS_FIELD, doc! { "$in": statuses.clone() });
    }

    if let Some(methods) = &filter.payment_methods {
        query.insert(PAYMENT_METHOD_FIELD, doc! { "$in": methods.clone() });
    }

    query
}

/// Newest first, ties broken by the secondary timestamp alias.
pub fn sort_document() -> Document {
    let mut sort = Document::new();
    for field in TIMESTAMP.aliases {
        sort.insert(*field, -1);
    }
    sort
}

/// Build an `$ifNull` chain over the aliases of `rule`.
///
/// `prefix` is the path of the containing document (`""` for the order
/// root, `"items."` for an unwound line item).
fn if_null(prefix: &str, rule: &AliasRule, default: Option<Bson>) -> Bson {
    let mut args: Vec<Bson> = rule
        .aliases
        .iter()
        .map(|alias| Bson::String(format!("${}{}", prefix, alias)))
        .collect();
    args.extend(default);

    if args.len() == 1 {
        return args.remove(0);
    }
    Bson::Document(doc! { "$ifNull": args })
}

/// Aggregation pipeline for the grouped-items report.
pub fn grouped_pipeline(filter: &OrderFilter) -> Vec<Document> {
    let item = format!("{}.", ITEM_LIST.canonical);
    let name = if_null(&item, &ITEM_NAME, Some(Bson::Null));
    let category = if_null(
        &item,
        &ITEM_CATEGORY,
        Some(Bson::String(DEFAULT_CATEGORY.to_string())),
    );
    let quantity = if_null(&item, &ITEM_QUANTITY, Some(Bson::Int32(1)));
    let price = if_null(&item, &ITEM_PRICE, Some(Bson::Int32(0)));

    let mut project = Document::new();
    project.insert(
        ITEM_LIST.canonical,
        if_null("", &ITEM_LIST, Some(Bson::Array(Vec::new()))),
    );

    vec![
        doc! { "$match": filter_document(filter) },
        doc! { "$project": project },
        doc! { "$unwind": format!("${}", ITEM_LIST.canonical) },
        doc! { "$match": { "$expr": { "$ne": [name.clone(), Bson::Null] } } },
        doc! {
            "$group": {
                "_id": name.clone(),
                "itemName": { "$first": name },
                "category": { "$first": category },
                "quantity": { "$sum": quantity.clone() },
                "subtotal": { "$sum": { "$multiply": [quantity, price] } },
            }
        },
        doc! { "$sort": { "quantity": -1, "_id": 1 } },
    ]
}

fn bson_to_string(value: Option<&Bson>) -> Option<String> {
    match value? {
        Bson::String(s) => Some(s.clone()),
        Bson::Null => None,
        other => Some(other.to_string()),
    }
}

fn bson_to_f64(value: Option<&Bson>) -> Option<f64> {
    match value? {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Decode one `$group` output document.
fn document_to_row(doc: &Document) -> QueryResult<GroupedRow> {
    let malformed = |field: &str| QueryError::AggregationFailure {
        message: format!("grouped row has no usable '{}': {}", field, doc),
    };

    let key = bson_to_string(doc.get("_id")).ok_or_else(|| malformed("_id"))?;
    Ok(GroupedRow {
        item_name: bson_to_string(doc.get("itemName")).unwrap_or_else(|| key.clone()),
        category: bson_to_string(doc.get("category"))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        quantity: bson_to_f64(doc.get("quantity")).ok_or_else(|| malformed("quantity"))?,
        subtotal: bson_to_f64(doc.get("subtotal")).ok_or_else(|| malformed("subtotal"))?,
        key,
    })
}

/// Whether a driver error means the branch could not be reached.
fn is_connectivity_error(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. }
    )
}

/// Map a driver error from `find` / `count`.
fn query_error(err: MongoError) -> QueryError {
    if is_connectivity_error(&err) {
        QueryError::PartitionUnavailable {
            message: err.to_string(),
        }
    } else if matches!(err.kind.as_ref(), ErrorKind::Command(_)) {
        QueryError::InvalidQuery {
            message: err.to_string(),
        }
    } else {
        QueryError::Internal {
            message: err.to_string(),
        }
    }
}

/// Map a driver error from `aggregate`.
fn aggregation_error(err: MongoError) -> QueryError {
    if is_connectivity_error(&err) {
        QueryError::PartitionUnavailable {
            message: err.to_string(),
        }
    } else if matches!(err.kind.as_ref(), ErrorKind::Command(_)) {
        QueryError::AggregationFailure {
            message: err.to_string(),
        }
    } else {
        QueryError::Internal {
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// MongoBranch
// ---------------------------------------------------------------------------

/// Connection to one branch's MongoDB deployment.
///
/// # Example
///
/// ```rust,ignore
/// use order_router::storage::MongoBranch;
///
/// let branch = MongoBranch::connect("mongodb://localhost:27017/branch1", None).await?;
/// registry.register(BranchId::new(1), Arc::new(branch), "globalorders")?;
/// ```
#[derive(Clone, Debug)]
pub struct MongoBranch {
    client: Client,
    database: String,
}

impl MongoBranch {
    /// Create a branch from an existing client.
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    /// Parse the connection string and create the client.
    ///
    /// Without an explicit `database`, the default database of the
    /// connection string is used. The driver connects lazily; reachability
    /// is checked when the order collection is first bound.
    pub async fn connect(uri: &str, database: Option<&str>) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| anyhow!("Failed to create MongoDB client: {}", e))?;

        let database = match database {
            Some(name) => name.to_string(),
            None => client
                .default_database()
                .map(|db| db.name().to_string())
                .ok_or_else(|| anyhow!("No database given and none in connection string"))?,
        };
        Ok(Self::new(client, database))
    }
}

#[async_trait]
impl BranchConnection for MongoBranch {
    async fn bind_orders(&self, collection: &str) -> QueryResult<Arc<dyn OrderStore>> {
        let database = self.client.database(&self.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| QueryError::PartitionUnavailable {
                message: e.to_string(),
            })?;

        Ok(Arc::new(MongoOrderStore::new(database.collection(collection))))
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

// ---------------------------------------------------------------------------
// MongoOrderStore
// ---------------------------------------------------------------------------

/// Read-only order accessor bound to one MongoDB collection.
#[derive(Clone, Debug)]
pub struct MongoOrderStore {
    collection: Collection<Document>,
}

impl MongoOrderStore {
    pub fn new(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl OrderStore for MongoOrderStore {
    async fn find(&self, filter: &OrderFilter, page: &PageRequest) -> QueryResult<Vec<Value>> {
        let limit = i64::try_from(page.page_size()).unwrap_or(i64::MAX);

        let cursor = self
            .collection
            .find(filter_document(filter))
            .sort(sort_document())
            .skip(page.skip())
            .limit(limit)
            .projection(doc! { "__v": 0 })
            .await
            .map_err(query_error)?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(query_error)?;

        Ok(docs.into_iter().map(document_to_json).collect())
    }

    async fn count(&self, filter: &OrderFilter) -> QueryResult<u64> {
        self.collection
            .count_documents(filter_document(filter))
            .await
            .map_err(query_error)
    }

    async fn aggregate_grouped(&self, filter: &OrderFilter) -> QueryResult<Vec<GroupedRow>> {
        let cursor = self
            .collection
            .aggregate(grouped_pipeline(filter))
            .await
            .map_err(aggregation_error)?;

        let docs: Vec<Document> = cursor.try_collect().await.map_err(aggregation_error)?;

        docs.iter().map(document_to_row).collect()
    }
}
