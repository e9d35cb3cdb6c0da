//! Field-alias resolution over schema-drifting order documents
//!
//! Branches were written by different generations of the point-of-sale
//! software, so the same logical value can live under several field names.
//! This module owns the alias table and its precedence: the in-process
//! grouping below and the MongoDB pipeline in `storage::mongodb` are both
//! generated from these rules.
//!
//! | Canonical field | Aliases (highest priority first) | Default |
//! |---|---|---|
//! | timestamp | `createdAt`, `order_date` | none |
//! | item list | `items`, `ordered_items` | empty list |
//! | item name | `name`, `item_name` | none (item skipped) |
//! | item category | `category_name`, `category` | `"Other"` |
//! | item quantity | `quantity` | `1` |
//! | item unit price | `price`, `unit_price` | `0` |
//!
//! A field counts as present when it exists and is not `null`.

use crate::core::error::{QueryError, QueryResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// One row of the alias table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasRule {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

pub const TIMESTAMP: AliasRule = AliasRule {
    canonical: "timestamp",
    aliases: &["createdAt", "order_date"],
};

pub const ITEM_LIST: AliasRule = AliasRule {
    canonical: "items",
    aliases: &["items", "ordered_items"],
};

pub const ITEM_NAME: AliasRule = AliasRule {
    canonical: "name",
    aliases: &["name", "item_name"],
};

pub const ITEM_CATEGORY: AliasRule = AliasRule {
    canonical: "category",
    aliases: &["category_name", "category"],
};

pub const ITEM_QUANTITY: AliasRule = AliasRule {
    canonical: "quantity",
    aliases: &["quantity"],
};

pub const ITEM_PRICE: AliasRule = AliasRule {
    canonical: "price",
    aliases: &["price", "unit_price"],
};

pub const DEFAULT_CATEGORY: &str = "Other";
pub const DEFAULT_QUANTITY: f64 = 1.0;
pub const DEFAULT_PRICE: f64 = 0.0;

/// Literal (non-aliased) membership fields
pub const STATUS_FIELD: &str = "status";
pub const PAYMENT_METHOD_FIELD: &str = "paymentMethod";

/// Return the value of the first present alias
pub fn resolve<'a>(doc: &'a Value, rule: &AliasRule) -> Option<&'a Value> {
    rule.aliases
        .iter()
        .filter_map(|alias| doc.get(alias))
        .find(|v| !v.is_null())
}

/// Parse a date or timestamp string
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` and `YYYY-MM-DD`; naive
/// values are taken as UTC.
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Interpret a stored timestamp value
///
/// Handles ISO strings, epoch milliseconds, and MongoDB extended JSON
/// (`{"$date": ...}`).
pub fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_datetime(s),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(map) => match map.get("$date")? {
            Value::Object(inner) => inner
                .get("$numberLong")
                .and_then(Value::as_str)
                .and_then(|s| s.parse::<i64>().ok())
                .and_then(DateTime::from_timestamp_millis),
            other => timestamp_value(other),
        },
        _ => None,
    }
}

/// Canonical timestamp of an order (first present alias)
pub fn order_timestamp(doc: &Value) -> Option<DateTime<Utc>> {
    resolve(doc, &TIMESTAMP).and_then(timestamp_value)
}

/// The order's line items, whichever alias holds them
///
/// A non-array value is treated as a single item, an absent list as empty.
pub fn order_items(doc: &Value) -> Vec<&Value> {
    match resolve(doc, &ITEM_LIST) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
        None => Vec::new(),
    }
}

/// A line item in canonical shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedItem {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit_price: f64,
}

impl NormalizedItem {
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

/// An order in canonical shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedOrder {
    pub timestamp: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub items: Vec<NormalizedItem>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn numeric(value: Option<&Value>, rule: &AliasRule, default: f64) -> QueryResult<f64> {
    match value {
        None => Ok(default),
        Some(v) => v.as_f64().ok_or_else(|| QueryError::AggregationFailure {
            message: format!("item {} is not numeric: {}", rule.canonical, v),
        }),
    }
}

/// Normalize one line item
///
/// Returns `Ok(None)` for items without a name under any alias. A present
/// but non-numeric quantity or price is an `AggregationFailure`.
pub fn normalize_item(item: &Value) -> QueryResult<Option<NormalizedItem>> {
    let Some(name) = resolve(item, &ITEM_NAME).and_then(scalar_to_string) else {
        return Ok(None);
    };
    let category = resolve(item, &ITEM_CATEGORY)
        .and_then(scalar_to_string)
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    let quantity = numeric(resolve(item, &ITEM_QUANTITY), &ITEM_QUANTITY, DEFAULT_QUANTITY)?;
    let unit_price = numeric(resolve(item, &ITEM_PRICE), &ITEM_PRICE, DEFAULT_PRICE)?;

    Ok(Some(NormalizedItem {
        name,
        category,
        quantity,
        unit_price,
    }))
}

/// Normalize a whole order document without touching it
pub fn normalize_order(doc: &Value) -> QueryResult<NormalizedOrder> {
    let mut items = Vec::new();
    for raw in order_items(doc) {
        if let Some(item) = normalize_item(raw)? {
            items.push(item);
        }
    }

    Ok(NormalizedOrder {
        timestamp: order_timestamp(doc),
        status: doc.get(STATUS_FIELD).and_then(scalar_to_string),
        payment_method: doc.get(PAYMENT_METHOD_FIELD).and_then(scalar_to_string),
        items,
    })
}

/// One row of the grouped-items report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedRow {
    #[serde(rename = "_id")]
    pub key: String,
    pub item_name: String,
    pub category: String,
    #[serde(serialize_with = "whole_as_integer")]
    pub quantity: f64,
    #[serde(serialize_with = "whole_as_integer")]
    pub subtotal: f64,
}

/// Sums of integer quantities are written as `5`, not `5.0`
fn whole_as_integer<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const EXACT: f64 = 9_007_199_254_740_992.0;
    if value.fract() == 0.0 && value.abs() <= EXACT {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Flatten line items of `orders` and group them by item name
///
/// Category is taken from the first item seen in each group. Rows are sorted
/// by quantity descending, then by item name.
pub fn group_items<'a, I>(orders: I) -> QueryResult<Vec<GroupedRow>>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut groups: IndexMap<String, GroupedRow> = IndexMap::new();

    for order in orders {
        for raw in order_items(order) {
            let Some(item) = normalize_item(raw)? else {
                continue;
            };
            let subtotal = item.subtotal();
            let row = groups
                .entry(item.name.clone())
                .or_insert_with(|| GroupedRow {
                    key: item.name.clone(),
                    item_name: item.name.clone(),
                    category: item.category.clone(),
                    quantity: 0.0,
                    subtotal: 0.0,
                });
            row.quantity += item.quantity;
            row.subtotal += subtotal;
        }
    }

    let mut rows: Vec<GroupedRow> = groups.into_values().collect();
    rows.sort_by(|a, b| {
        b.quantity
            .total_cmp(&a.quantity)
            .then_with(|| a.key.cmp(&b.key))
    });
    Ok(rows)
}
