//! HTTP handlers for the order endpoints
//!
//! Handlers only translate between HTTP and [`OrderService`]: every request
//! ends in either a success envelope or an error envelope, never a bare body.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::time::Instant;

use crate::config::Environment;
use crate::core::error::QueryError;
use crate::core::query::OrderQuery;
use crate::core::service::OrderService;
use crate::server::response::{GroupedEnvelope, OrderPageEnvelope};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: OrderService,
    pub environment: Environment,
}

impl AppState {
    pub fn new(service: OrderService, environment: Environment) -> Self {
        Self {
            service,
            environment,
        }
    }

    /// Log a failed request and render its error envelope
    fn fail(&self, branch: &str, err: QueryError) -> Response {
        if err.is_validation() {
            tracing::warn!(branch = %branch, error = err.error_code(), message = %err, "request rejected");
        } else {
            tracing::error!(
                branch = %branch,
                error = err.error_code(),
                details = err.details().unwrap_or_default(),
                "request failed"
            );
        }
        err.into_response_with(self.environment.exposes_details())
    }
}

/// Unparseable query strings (e.g. a repeated key) become an error envelope
fn query_params(
    params: Result<Query<OrderQuery>, QueryRejection>,
) -> Result<OrderQuery, QueryError> {
    params
        .map(|Query(query)| query)
        .map_err(|rejection| QueryError::InvalidQuery {
            message: rejection.body_text(),
        })
}

/// A branch segment that cannot be decoded (e.g. invalid UTF-8) is an unknown branch
fn branch_param(path: Result<Path<String>, PathRejection>) -> Result<String, QueryError> {
    path.map(|Path(branch)| branch)
        .map_err(|rejection| QueryError::InvalidBranch {
            branch: rejection.body_text(),
        })
}

/// List a branch's orders, newest first
///
/// GET /branch/{branch}/orders?startDate=&endDate=&status=&paymentMethod=&page=&limit=
pub async fn list_orders(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    params: Result<Query<OrderQuery>, QueryRejection>,
) -> Response {
    let started = Instant::now();

    let branch = match branch_param(path) {
        Ok(branch) => branch,
        Err(err) => return state.fail("-", err),
    };
    let query = match query_params(params) {
        Ok(query) => query,
        Err(err) => return state.fail(&branch, err),
    };

    match state.service.list_orders(&branch, &query).await {
        Ok(page) => {
            Json(OrderPageEnvelope::new(branch, page, Some(started.elapsed()))).into_response()
        }
        Err(err) => state.fail(&branch, err),
    }
}

/// Per-item quantity and revenue report for a branch
///
/// GET /branch/{branch}/orders/grouped?startDate=&endDate=&status=&paymentMethod=
pub async fn grouped_orders(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    params: Result<Query<OrderQuery>, QueryRejection>,
) -> Response {
    let branch = match branch_param(path) {
        Ok(branch) => branch,
        Err(err) => return state.fail("-", err),
    };
    let query = match query_params(params) {
        Ok(query) => query,
        Err(err) => return state.fail(&branch, err),
    };

    match state.service.grouped_items(&branch, &query).await {
        Ok(rows) => Json(GroupedEnvelope::new(branch, rows)).into_response(),
        Err(err) => state.fail(&branch, err),
    }
}

/// Liveness probe
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "order-router"
    }))
}
