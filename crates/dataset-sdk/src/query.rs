//! Reference evaluation of a `DataRequest` over rows held in memory.
//!
//! Semantics follow the SQL the hosted service generates: filters are ANDed,
//! `like` is a case-sensitive substring match, comparisons against NULL never
//! match, NULLs sort last ascending and first descending, and rows without an
//! explicit ordering come back by `id`.

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

use crate::{DataRequest, FilterCondition, FilterOperator, PageResult, Record, SortCondition, SortDirection};

/// Text columns scanned by `global_search`.
pub const DEFAULT_SEARCH_COLUMNS: [&str; 3] = ["name", "version", "description"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatasetError {
    #[error("filter column must not be empty")]
    EmptyColumn,
    #[error("operator `{operator}` on column `{column}` requires a list value")]
    ExpectedList {
        column: String,
        operator: FilterOperator,
    },
}

pub fn validate_filters(filters: &[FilterCondition]) -> Result<(), DatasetError> {
    for filter in filters {
        if filter.column.trim().is_empty() {
            return Err(DatasetError::EmptyColumn);
        }
        if filter.operator.expects_list() && !filter.value.is_array() {
            return Err(DatasetError::ExpectedList {
                column: filter.column.clone(),
                operator: filter.operator,
            });
        }
    }
    Ok(())
}

/// Runs `request` against `records` and returns the requested page together
/// with the number of matching rows.
pub fn run_query<S: AsRef<str>>(
    records: &[Record],
    request: &DataRequest,
    search_columns: &[S],
) -> Result<PageResult, DatasetError> {
    validate_filters(&request.filters)?;

    let needle = request
        .global_search
        .as_deref()
        .filter(|needle| !needle.is_empty());
    let mut matched: Vec<&Record> = records
        .iter()
        .filter(|record| request.filters.iter().all(|f| matches_filter(record, f)))
        .filter(|record| needle.map_or(true, |n| matches_search(record, n, search_columns)))
        .collect();
    let total = matched.len() as u64;

    let mut sorts: Vec<&SortCondition> = request.sorts.iter().collect();
    sorts.sort_by_key(|sort| sort.priority);
    matched.sort_by(|a, b| order_records(a, b, &sorts));

    let data = matched
        .into_iter()
        .skip(request.offset)
        .take(request.limit)
        .cloned()
        .collect();
    Ok(PageResult { data, total })
}

fn matches_filter(record: &Record, filter: &FilterCondition) -> bool {
    let Some(actual) = record.column_value(&filter.column) else {
        return false;
    };
    let actual = actual.as_ref();
    if actual.is_null() {
        return false;
    }
    let ordering = || compare_values(actual, &filter.value);
    match filter.operator {
        FilterOperator::Eq => ordering() == Some(Ordering::Equal),
        FilterOperator::Ne => matches!(ordering(), Some(o) if o != Ordering::Equal),
        FilterOperator::Gt => ordering() == Some(Ordering::Greater),
        FilterOperator::Lt => ordering() == Some(Ordering::Less),
        FilterOperator::Ge => matches!(ordering(), Some(Ordering::Greater | Ordering::Equal)),
        FilterOperator::Le => matches!(ordering(), Some(Ordering::Less | Ordering::Equal)),
        FilterOperator::Like => match (actual.as_str(), like_pattern(&filter.value)) {
            (Some(haystack), Some(pattern)) => haystack.contains(pattern.as_str()),
            _ => false,
        },
        FilterOperator::In => list_contains(&filter.value, actual).unwrap_or(false),
        FilterOperator::NotIn => list_contains(&filter.value, actual).map_or(false, |hit| !hit),
    }
}

fn like_pattern(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn list_contains(list: &Value, actual: &Value) -> Option<bool> {
    let values = list.as_array()?;
    Some(
        values
            .iter()
            .any(|candidate| compare_values(actual, candidate) == Some(Ordering::Equal)),
    )
}

fn matches_search<S: AsRef<str>>(record: &Record, needle: &str, columns: &[S]) -> bool {
    columns.iter().any(|column| {
        record
            .column_value(column.as_ref())
            .as_deref()
            .and_then(Value::as_str)
            .is_some_and(|text| text.contains(needle))
    })
}

/// Compares two scalars of the same JSON type. Mixed types and NULLs are
/// incomparable.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn order_records(a: &Record, b: &Record, sorts: &[&SortCondition]) -> Ordering {
    for sort in sorts {
        let left = a.column_value(&sort.column);
        let right = b.column_value(&sort.column);
        let ordering = sort_key_cmp(left.as_deref(), right.as_deref());
        let ordering = match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.id.cmp(&b.id)
}

// NULL compares greater than any value.
fn sort_key_cmp(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            compare_values(x, y).unwrap_or_else(|| type_rank(x).cmp(&type_rank(y)))
        }
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Record> {
        vec![
            Record::new(1)
                .with_field("name", "Alice")
                .with_field("version", "1.2.0")
                .with_field("country", 10)
                .with_field("parent", Value::Null),
            Record::new(2)
                .with_field("name", "Bob")
                .with_field("version", "3.0.1")
                .with_field("country", 20)
                .with_field("parent", 5),
            Record::new(3)
                .with_field("name", "Carol")
                .with_field("description", "Bob's manager")
                .with_field("version", "1.0.0")
                .with_field("country", 10)
                .with_field("parent", 1),
            Record::new(4)
                .with_field("name", "alice")
                .with_field("version", "2.5.9")
                .with_field("country", 30)
                .with_field("parent", Value::Null),
        ]
    }

    fn ids(page: &PageResult) -> Vec<i64> {
        page.data.iter().map(|r| r.id).collect()
    }

    fn request() -> DataRequest {
        DataRequest::page(0, 100)
    }

    #[test]
    fn unsorted_results_come_back_by_id() {
        let page = run_query(&rows(), &request(), &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![1, 2, 3, 4]);
        assert_eq!(page.total, 4);
    }

    #[test]
    fn total_counts_matches_before_paging() {
        let mut req = DataRequest::page(1, 1);
        req.filters
            .push(FilterCondition::new("country", FilterOperator::Eq, 10));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![3]);
        assert_eq!(page.total, 2);
    }

    #[test]
    fn comparison_operators_skip_nulls() {
        let mut req = request();
        req.filters
            .push(FilterCondition::new("parent", FilterOperator::Ne, 5));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![3]);

        let mut req = request();
        req.filters
            .push(FilterCondition::new("country", FilterOperator::Ge, 20));
        req.filters
            .push(FilterCondition::new("country", FilterOperator::Lt, 30));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![2]);
    }

    #[test]
    fn like_is_a_case_sensitive_substring_match() {
        let mut req = request();
        req.filters
            .push(FilterCondition::new("name", FilterOperator::Like, "lic"));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![1, 4]);

        let mut req = request();
        req.filters
            .push(FilterCondition::new("name", FilterOperator::Like, "Ali"));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![1]);
    }

    #[test]
    fn membership_operators_require_lists() {
        let mut req = request();
        req.filters.push(FilterCondition::new(
            "country",
            FilterOperator::In,
            json!([20, 30]),
        ));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![2, 4]);

        let mut req = request();
        req.filters.push(FilterCondition::new(
            "country",
            FilterOperator::NotIn,
            json!([20, 30]),
        ));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![1, 3]);

        let mut req = request();
        req.filters
            .push(FilterCondition::new("country", FilterOperator::In, 20));
        let err = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap_err();
        assert!(matches!(err, DatasetError::ExpectedList { .. }));
    }

    #[test]
    fn global_search_scans_text_columns() {
        let mut req = request();
        req.global_search = Some("Bob".into());
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![2, 3]);

        req.global_search = Some("1.".into());
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![1, 3]);

        req.global_search = Some(String::new());
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(page.total, 4);
    }

    #[test]
    fn sorts_apply_by_priority_with_postgres_null_placement() {
        let mut req = request();
        req.sorts
            .push(SortCondition::new("id", SortDirection::Desc, 2));
        req.sorts
            .push(SortCondition::new("country", SortDirection::Asc, 1));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![3, 1, 2, 4]);

        let mut req = request();
        req.sorts
            .push(SortCondition::new("parent", SortDirection::Asc, 1));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![3, 2, 1, 4]);

        let mut req = request();
        req.sorts
            .push(SortCondition::new("parent", SortDirection::Desc, 1));
        let page = run_query(&rows(), &req, &DEFAULT_SEARCH_COLUMNS).unwrap();
        assert_eq!(ids(&page), vec![1, 4, 2, 3]);
    }
}
