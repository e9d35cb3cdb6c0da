//! Macro-generated test suite for `OrderStore` contract validation.
//!
//! The `order_store_tests!` macro generates a test module that runs the same
//! checks against any backend: ordering across timestamp aliases, paging,
//! every filter kind, and the grouped report over drifted item fields.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//!
//! async fn seeded_store(orders: Vec<serde_json::Value>) -> Arc<dyn OrderStore> { ... }
//!
//! order_store_tests!(seeded_store);
//! ```
//!
//! `$factory` is an async function taking the documents to seed and
//! returning a bound `Arc<dyn OrderStore>` over a fresh collection.

#[macro_export]
macro_rules! order_store_tests {
    ($factory:path) => {
        mod order_store_contract_tests {
            use super::*;
            use order_router::core::filter::build_filter;
            use order_router::core::{OrderFilter, OrderQuery, OrderStore, PageRequest};

            fn filter(query: OrderQuery) -> OrderFilter {
                build_filter(&query).expect("valid filter")
            }

            fn january() -> OrderQuery {
                OrderQuery {
                    start_date: Some("2024-01-01".to_string()),
                    end_date: Some("2024-01-31".to_string()),
                    ..Default::default()
                }
            }

            fn everything() -> PageRequest {
                PageRequest::new(1, 100).unwrap()
            }

            // ==================================================================
            // Ordering & paging
            // ==================================================================

            #[tokio::test]
            async fn test_find_newest_first_across_aliases() {
                let store = $factory(drifted_orders()).await;

                let docs = store.find(&OrderFilter::default(), &everything()).await.unwrap();

                // createdAt decides; the order_date-only document sorts last
                assert_eq!(order_numbers(&docs), vec![3, 5, 1, 4, 2]);
            }

            #[tokio::test]
            async fn test_pages_partition_the_result() {
                let store = $factory(daily_orders(25)).await;
                let all = OrderFilter::default();

                let mut seen = Vec::new();
                for (page, expected_len) in [(1, 10), (2, 10), (3, 5), (4, 0)] {
                    let docs = store
                        .find(&all, &PageRequest::new(page, 10).unwrap())
                        .await
                        .unwrap();
                    assert_eq!(docs.len(), expected_len, "page {}", page);
                    seen.extend(timestamps(&docs));
                }

                assert_eq!(seen.len(), 25);
                assert!(seen.iter().all(Option::is_some));
                assert!(seen.windows(2).all(|w| w[0] > w[1]), "strictly newest first");
                assert_eq!(store.count(&all).await.unwrap(), 25);
            }

            // ==================================================================
            // Filters
            // ==================================================================

            #[tokio::test]
            async fn test_count_without_filter() {
                let store = $factory(drifted_orders()).await;
                assert_eq!(store.count(&OrderFilter::default()).await.unwrap(), 5);
            }

            #[tokio::test]
            async fn test_date_range_matches_either_alias() {
                let store = $factory(drifted_orders()).await;
                let january = filter(january());

                let docs = store.find(&january, &everything()).await.unwrap();
                assert_eq!(order_numbers(&docs), vec![5, 1, 2]);
                assert_eq!(store.count(&january).await.unwrap(), 3);
            }

            #[tokio::test]
            async fn test_date_range_bounds_are_inclusive() {
                let store = $factory(drifted_orders()).await;
                let exact = filter(OrderQuery {
                    start_date: Some("2024-01-10T10:00:00Z".to_string()),
                    end_date: Some("2024-01-12T09:00:00Z".to_string()),
                    ..Default::default()
                });

                let docs = store.find(&exact, &everything()).await.unwrap();
                assert_eq!(order_numbers(&docs), vec![1, 2]);
            }

            #[tokio::test]
            async fn test_status_membership() {
                let store = $factory(drifted_orders()).await;
                let statuses = filter(OrderQuery {
                    status: Some("paid, pending".to_string()),
                    ..Default::default()
                });

                let docs = store.find(&statuses, &everything()).await.unwrap();
                assert_eq!(order_numbers(&docs), vec![5, 1, 4, 2]);
                assert_eq!(store.count(&statuses).await.unwrap(), 4);
            }

            #[tokio::test]
            async fn test_filters_are_conjunctive() {
                let store = $factory(drifted_orders()).await;
                let combined = filter(OrderQuery {
                    status: Some("paid".to_string()),
                    payment_method: Some("card".to_string()),
                    ..january()
                });

                let docs = store.find(&combined, &everything()).await.unwrap();
                assert_eq!(order_numbers(&docs), vec![5, 1]);
                assert_eq!(store.count(&combined).await.unwrap(), 2);
            }

            #[tokio::test]
            async fn test_filter_matching_nothing() {
                let store = $factory(drifted_orders()).await;
                let none = filter(OrderQuery {
                    status: Some("NONEXISTENT".to_string()),
                    ..Default::default()
                });

                assert!(store.find(&none, &everything()).await.unwrap().is_empty());
                assert_eq!(store.count(&none).await.unwrap(), 0);
                assert!(store.aggregate_grouped(&none).await.unwrap().is_empty());
            }

            // ==================================================================
            // Grouped report
            // ==================================================================

            #[tokio::test]
            async fn test_grouped_merges_item_aliases() {
                let store = $factory(drifted_orders()).await;

                let rows = store.aggregate_grouped(&OrderFilter::default()).await.unwrap();
                let names: Vec<_> = rows.iter().map(|r| r.item_name.as_str()).collect();

                // Tea first by quantity, then quantity ties by name; nameless item dropped
                assert_eq!(names, ["Tea", "Cake", "Juice", "Scone"]);

                assert_eq!(rows[0].key, "Tea");
                assert_eq!(rows[0].category, "Drinks");
                assert_eq!(rows[0].quantity, 5.0);
                assert_eq!(rows[0].subtotal, 25.0);

                assert_eq!(rows[1].category, "Bakery");
                assert_eq!(rows[1].subtotal, 20.0);
            }

            #[tokio::test]
            async fn test_grouped_applies_item_defaults() {
                let store = $factory(drifted_orders()).await;

                let rows = store.aggregate_grouped(&OrderFilter::default()).await.unwrap();
                let scone = rows
                    .iter()
                    .find(|r| r.item_name == "Scone")
                    .expect("Scone row");

                assert_eq!(scone.category, "Other");
                assert_eq!(scone.quantity, 1.0);
                assert_eq!(scone.subtotal, 0.0);
            }

            #[tokio::test]
            async fn test_grouped_respects_filter() {
                let store = $factory(drifted_orders()).await;
                let january = filter(january());

                let rows = store.aggregate_grouped(&january).await.unwrap();
                let names: Vec<_> = rows.iter().map(|r| r.item_name.as_str()).collect();
                assert_eq!(names, ["Tea", "Cake", "Juice"]);
            }
        }
    };
}
