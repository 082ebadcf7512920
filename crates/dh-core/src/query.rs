//! # Store Query Model
//!
//! The query surface the document store exposes: equality, range, and
//! bounded membership filters, a single-field sort, a result limit, and an
//! opaque forward cursor. This mirrors what the hosted backend offers and
//! nothing more; there is no join, no aggregation, no multi-field sort.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Document;

/// Upper bound on membership-filter width, inherited from the hosted store's
/// `in` operator. Call sites that derive wider value sets must truncate
/// before querying; adapters reject anything wider.
pub const MAX_MEMBERSHIP_VALUES: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    /// Exact match, canonical-form tolerant (`3` matches `"3"`).
    Eq,
    /// Less-or-equal under [`compare_values`].
    Le,
    /// Greater-or-equal under [`compare_values`].
    Ge,
    /// Membership in a bounded value list.
    In,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), op: FilterOp::Eq, value: value.into() }
    }

    pub fn le(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), op: FilterOp::Le, value: value.into() }
    }

    pub fn ge(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { field: field.into(), op: FilterOp::Ge, value: value.into() }
    }

    pub fn any_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self { field: field.into(), op: FilterOp::In, value: Value::Array(values) }
    }

    /// Whether a document passes this filter. A missing field never matches.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.field(&self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => values_equal(actual, &self.value),
            FilterOp::Le => compare_values(actual, &self.value) != Ordering::Greater,
            FilterOp::Ge => compare_values(actual, &self.value) != Ordering::Less,
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|values| values.iter().any(|v| values_equal(actual, v))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Opaque resume point: the position of the last document of the previous
/// page under the query's sort order. The contents are an implementation
/// detail; a cursor is only valid for the filter/sort combination that
/// produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub sort_value: Value,
    pub doc_id: String,
}

/// A collection-scoped read. Without a sort, documents come back ordered by
/// document id, which for store-assigned ids is creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub sort: Option<Sort>,
    pub limit: Option<usize>,
    pub start_after: Option<Cursor>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            sort: None,
            limit: None,
            start_after: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort { field: field.into(), direction });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    /// Whether a document passes every filter.
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }
}

/// One page of results plus the cursor for the page after it. `next_cursor`
/// is `None` exactly when the page came back empty.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub docs: Vec<Document>,
    pub next_cursor: Option<Cursor>,
}

/// Canonical comparison form shared by both store adapters: a number and a
/// string that spell the same identifier compare equal, which is how the
/// mixed-generation documents join.
pub fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn values_equal(a: &Value, b: &Value) -> bool {
    a == b || canonical(a) == canonical(b)
}

/// Total order used for sorting and range filters: null < bool < number <
/// string < array < object; numbers numerically, strings lexicographically
/// (ISO dates therefore sort chronologically).
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or_default()
            .partial_cmp(&y.as_f64().unwrap_or_default())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
