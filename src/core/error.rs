//! Typed error handling for the order query engine
//!
//! Every failure a request can hit is one of the [`QueryError`] kinds below.
//! Handlers never branch on message text: they match on the kind, and the
//! kind decides the HTTP status class and the stable `error` code that ends
//! up in the response envelope.
//!
//! # Example
//!
//! ```rust,ignore
//! match service.list_orders("7", &query).await {
//!     Err(QueryError::InvalidBranch { branch }) => println!("no such branch {branch}"),
//!     Err(QueryError::PartitionUnavailable { .. }) => println!("try again later"),
//!     Err(e) => eprintln!("other error: {e}"),
//!     Ok(page) => println!("{} orders", page.items.len()),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The closed set of failures produced by the engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    /// Branch identifier is not one of the configured partitions
    #[error("Branch '{branch}' does not exist")]
    InvalidBranch { branch: String },

    /// A date parameter could not be parsed
    #[error("Invalid date format for '{field}': '{value}' (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDateFormat { field: String, value: String },

    /// startDate is later than endDate
    #[error("startDate '{start}' is after endDate '{end}'")]
    StartAfterEnd { start: String, end: String },

    /// page or limit outside the accepted range
    #[error("Invalid pagination: {message}")]
    InvalidPagination { message: String },

    /// Malformed predicate reached the store
    #[error("Invalid query format")]
    InvalidQuery { message: String },

    /// The branch's store could not be reached
    #[error("Database connection error")]
    PartitionUnavailable { message: String },

    /// The store rejected the grouping pipeline
    #[error("Aggregation pipeline failed")]
    AggregationFailure { message: String },

    /// Anything else
    #[error("Internal server error")]
    Internal { message: String },
}

/// Error envelope returned to callers
///
/// `details` is only populated outside production mode.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl QueryError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryError::InvalidBranch { .. }
            | QueryError::InvalidDateFormat { .. }
            | QueryError::StartAfterEnd { .. }
            | QueryError::InvalidPagination { .. }
            | QueryError::InvalidQuery { .. }
            | QueryError::AggregationFailure { .. } => StatusCode::BAD_REQUEST,
            QueryError::PartitionUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            QueryError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the stable error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            QueryError::InvalidBranch { .. } => "INVALID_BRANCH",
            QueryError::InvalidDateFormat { .. } => "INVALID_DATE_FORMAT",
            QueryError::StartAfterEnd { .. } => "START_DATE_AFTER_END_DATE",
            QueryError::InvalidPagination { .. } => "INVALID_PAGINATION",
            QueryError::InvalidQuery { .. } => "INVALID_QUERY_FORMAT",
            QueryError::PartitionUnavailable { .. } => "DB_CONNECTION_ERROR",
            QueryError::AggregationFailure { .. } => "AGGREGATION_ERROR",
            QueryError::Internal { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Whether the error stems from caller input rather than the store
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidBranch { .. }
                | QueryError::InvalidDateFormat { .. }
                | QueryError::StartAfterEnd { .. }
                | QueryError::InvalidPagination { .. }
        )
    }

    /// Internal detail for debugging, never shown in production
    pub fn details(&self) -> Option<&str> {
        match self {
            QueryError::InvalidQuery { message }
            | QueryError::AggregationFailure { message }
            | QueryError::Internal { message } => Some(message),
            _ => None,
        }
    }

    /// Convert to an error envelope
    pub fn to_envelope(&self, expose_details: bool) -> ErrorEnvelope {
        ErrorEnvelope {
            success: false,
            error: self.error_code().to_string(),
            message: self.to_string(),
            details: if expose_details {
                self.details().map(str::to_string)
            } else {
                None
            },
        }
    }

    /// Build the HTTP response, optionally carrying internal details
    pub fn into_response_with(self, expose_details: bool) -> Response {
        let status = self.status_code();
        (status, Json(self.to_envelope(expose_details))).into_response()
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

impl From<anyhow::Error> for QueryError {
    fn from(err: anyhow::Error) -> Self {
        QueryError::Internal {
            message: err.to_string(),
        }
    }
}

/// A specialized Result type for engine operations
pub type QueryResult<T> = Result<T, QueryError>;
