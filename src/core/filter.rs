//! Filter builder
//!
//! Turns raw request options into an [`OrderFilter`]: a conjunction of an
//! optional date range (matched against either timestamp alias), an optional
//! status membership and an optional payment-method membership. The same
//! filter feeds both the paginated fetch and the grouped aggregation.

use crate::core::error::{QueryError, QueryResult};
use crate::core::normalize::{
    PAYMENT_METHOD_FIELD, STATUS_FIELD, TIMESTAMP, parse_datetime, timestamp_value,
};
use crate::core::query::OrderQuery;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// Inclusive timestamp bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// A composed order predicate
///
/// `None` sub-filters are absent, not match-all placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderFilter {
    pub date_range: Option<DateRange>,
    pub statuses: Option<Vec<String>>,
    pub payment_methods: Option<Vec<String>>,
}

impl OrderFilter {
    /// True when no sub-filter is set
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none() && self.statuses.is_none() && self.payment_methods.is_none()
    }

    /// Reject shapes the builder never produces
    pub fn check(&self) -> QueryResult<()> {
        if let Some(range) = &self.date_range
            && range.start > range.end
        {
            return Err(QueryError::InvalidQuery {
                message: format!("date range start {} is after end {}", range.start, range.end),
            });
        }
        for (field, list) in [
            (STATUS_FIELD, &self.statuses),
            (PAYMENT_METHOD_FIELD, &self.payment_methods),
        ] {
            if list.as_ref().is_some_and(Vec::is_empty) {
                return Err(QueryError::InvalidQuery {
                    message: format!("empty membership list for '{}'", field),
                });
            }
        }
        Ok(())
    }

    /// Evaluate the predicate against a stored document
    pub fn matches(&self, doc: &Value) -> bool {
        if let Some(range) = &self.date_range {
            let in_range = TIMESTAMP.aliases.iter().any(|alias| {
                doc.get(alias)
                    .and_then(timestamp_value)
                    .is_some_and(|ts| range.contains(ts))
            });
            if !in_range {
                return false;
            }
        }
        member_of(doc, STATUS_FIELD, self.statuses.as_deref())
            && member_of(doc, PAYMENT_METHOD_FIELD, self.payment_methods.as_deref())
    }
}

fn member_of(doc: &Value, field: &str, allowed: Option<&[String]>) -> bool {
    let Some(allowed) = allowed else {
        return true;
    };
    doc.get(field)
        .and_then(Value::as_str)
        .is_some_and(|v| allowed.iter().any(|a| a == v))
}

/// Split a comma-separated list, trimming and dropping empty tokens
///
/// Returns `None` when nothing is left.
pub fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    let values: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!values.is_empty()).then_some(values)
}

fn parse_bound(field: &str, raw: &str) -> QueryResult<DateTime<Utc>> {
    parse_datetime(raw).ok_or_else(|| QueryError::InvalidDateFormat {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Build the date sub-filter
///
/// Both bounds must be present and non-empty for a range to be produced.
pub fn build_date_range(start: Option<&str>, end: Option<&str>) -> QueryResult<Option<DateRange>> {
    let (Some(start_raw), Some(end_raw)) = (
        start.filter(|s| !s.trim().is_empty()),
        end.filter(|s| !s.trim().is_empty()),
    ) else {
        return Ok(None);
    };

    let start = parse_bound("startDate", start_raw)?;
    let end = parse_bound("endDate", end_raw)?;

    if start > end {
        return Err(QueryError::StartAfterEnd {
            start: start_raw.to_string(),
            end: end_raw.to_string(),
        });
    }

    Ok(Some(DateRange { start, end }))
}

/// Build the order filter for a request
pub fn build_filter(query: &OrderQuery) -> QueryResult<OrderFilter> {
    Ok(OrderFilter {
        date_range: build_date_range(query.start_date.as_deref(), query.end_date.as_deref())?,
        statuses: split_list(query.status.as_deref()),
        payment_methods: split_list(query.payment_method.as_deref()),
    })
}
