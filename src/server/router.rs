//! Route table

use crate::server::handlers::{AppState, grouped_orders, health_check, list_orders};
use axum::{Router, routing::get};

/// Build the order routes
///
/// - GET /branch/{branch}/orders - Paginated order listing
/// - GET /branch/{branch}/orders/grouped - Grouped line-item report
pub fn build_order_routes(state: AppState) -> Router {
    Router::new()
        .route("/branch/{branch}/orders", get(list_orders))
        .route("/branch/{branch}/orders/grouped", get(grouped_orders))
        .with_state(state)
}

/// Build health check routes
pub fn build_health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}
