//! Client-side contract for the paginated dataset service.
//!
//! The dataset service answers one request shape (`DataRequest`) with one
//! response shape (`PageResult`). This crate carries those wire types, the
//! `DatasetService` seam consumed by window stores, an HTTP client for a
//! remote service, and an in-memory service used by tests and the local
//! dataset server.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod client;
pub mod query;
pub mod service;

pub use client::HttpDatasetService;
pub use query::{DatasetError, DEFAULT_SEARCH_COLUMNS};
pub use service::{DatasetService, FetchError, InMemoryDatasetService};

/// One row of the remote dataset. Only `id` is meaningful to window stores;
/// every other column travels untouched in `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Value of `column`, treating `id` as a regular column.
    pub fn column_value(&self, column: &str) -> Option<Cow<'_, Value>> {
        if column == "id" {
            return Some(Cow::Owned(Value::from(self.id)));
        }
        self.fields.get(column).map(Cow::Borrowed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "like", alias = "LIKE")]
    Like,
    #[serde(rename = "in", alias = "IN")]
    In,
    #[serde(rename = "not in", alias = "NOT IN")]
    NotIn,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Ge => ">=",
            FilterOperator::Le => "<=",
            FilterOperator::Like => "like",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not in",
        }
    }

    /// Operators whose value must be a list.
    pub fn expects_list(&self) -> bool {
        matches!(self, FilterOperator::In | FilterOperator::NotIn)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `column <operator> value` predicate. Several conditions on the
/// same column are independent and all must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
}

impl FilterCondition {
    pub fn new(column: impl Into<String>, operator: FilterOperator, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "ASC")]
    Asc,
    #[serde(alias = "DESC")]
    Desc,
}

/// Ordering key. Lower `priority` sorts first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortCondition {
    pub column: String,
    pub direction: SortDirection,
    pub priority: u32,
}

impl SortCondition {
    pub fn new(column: impl Into<String>, direction: SortDirection, priority: u32) -> Self {
        Self {
            column: column.into(),
            direction,
            priority,
        }
    }
}

/// Body of `POST /data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRequest {
    pub offset: usize,
    pub limit: usize,
    #[serde(default)]
    pub filters: Vec<FilterCondition>,
    #[serde(default)]
    pub sorts: Vec<SortCondition>,
    #[serde(default)]
    pub global_search: Option<String>,
}

impl DataRequest {
    pub fn page(offset: usize, limit: usize) -> Self {
        Self {
            offset,
            limit,
            filters: Vec::new(),
            sorts: Vec::new(),
            global_search: None,
        }
    }
}

/// The service's answer to one `DataRequest`. `total` counts every match,
/// not just the rows in `data`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageResult {
    pub data: Vec<Record>,
    pub total: u64,
}
