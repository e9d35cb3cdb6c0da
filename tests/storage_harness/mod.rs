//! Shared test harness for branch backend testing
//!
//! Provides a fixed set of drifted order documents (mixed timestamp, item
//! list and item field aliases) and helpers for reading results back.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use order_router::core::normalize::order_timestamp;
use serde_json::{Value, json};

#[macro_use]
pub mod order_store_tests;

/// Five orders spread over three schema variants
///
/// | orderNo | timestamp field | status    | paymentMethod | items                     |
/// |---------|-----------------|-----------|---------------|---------------------------|
/// | 1       | createdAt 01-10 | paid      | card          | Tea x2 @5, Cake x1 @20    |
/// | 2       | order_date 01-12| paid      | cash          | Tea x3 @5 (ordered_items) |
/// | 3       | createdAt 02-01 | cancelled | card          | Scone (defaults), nameless|
/// | 4       | createdAt 12-31 | pending   | upi           | none                      |
/// | 5       | createdAt 01-20 | paid      | card          | Juice x1 @4               |
pub fn drifted_orders() -> Vec<Value> {
    vec![
        json!({
            "orderNo": 1,
            "createdAt": "2024-01-10T10:00:00Z",
            "status": "paid",
            "paymentMethod": "card",
            "items": [
                {"name": "Tea", "category_name": "Drinks", "quantity": 2, "price": 5},
                {"name": "Cake", "category": "Bakery", "quantity": 1, "price": 20}
            ]
        }),
        json!({
            "orderNo": 2,
            "order_date": "2024-01-12T09:00:00Z",
            "status": "paid",
            "paymentMethod": "cash",
            "ordered_items": [
                {"item_name": "Tea", "category": "Drinks", "quantity": 3, "unit_price": 5}
            ]
        }),
        json!({
            "orderNo": 3,
            "createdAt": "2024-02-01T08:00:00Z",
            "status": "cancelled",
            "paymentMethod": "card",
            "items": [
                {"name": "Scone"},
                {"quantity": 4, "price": 1}
            ]
        }),
        json!({
            "orderNo": 4,
            "createdAt": "2023-12-31T23:59:59Z",
            "status": "pending",
            "paymentMethod": "upi",
            "items": []
        }),
        json!({
            "orderNo": 5,
            "createdAt": "2024-01-20T12:00:00Z",
            "status": "paid",
            "paymentMethod": "card",
            "items": [
                {"name": "Juice", "category_name": "Drinks", "quantity": 1, "price": 4}
            ]
        }),
    ]
}

/// `count` orders with consecutive daily `createdAt` timestamps
pub fn daily_orders(count: u32) -> Vec<Value> {
    (0..count)
        .map(|n| {
            let day = DateTime::from_timestamp(1_704_067_200 + i64::from(n) * 86_400, 0)
                .unwrap_or_default();
            json!({
                "orderNo": n + 1,
                "createdAt": day.to_rfc3339(),
                "status": "paid",
                "items": [{"name": "Tea", "quantity": 1, "price": 5}]
            })
        })
        .collect()
}

/// The `orderNo` of each document, in order
pub fn order_numbers(docs: &[Value]) -> Vec<u64> {
    docs.iter()
        .map(|d| d["orderNo"].as_u64().expect("fixture has an orderNo"))
        .collect()
}

/// The canonical timestamp of each document, in order
pub fn timestamps(docs: &[Value]) -> Vec<Option<DateTime<Utc>>> {
    docs.iter().map(order_timestamp).collect()
}
