use dataset_sdk::{DataRequest, FilterCondition, SortCondition};
use serde::{Deserialize, Serialize};

/// Offset/limit pair set by page navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Pagination {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// Zero-based page `index` of `limit` rows.
    pub fn page(index: usize, limit: usize) -> Self {
        Self {
            offset: index.saturating_mul(limit),
            limit,
        }
    }
}

/// What the window currently asks the dataset service for.
///
/// Every setter bumps `generation`, which lets fetches notice that the query
/// moved on while their response was in flight. Editing filters, sorts, or
/// the search text always returns to the first page.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryState {
    pub offset: usize,
    /// Zero means unset; callers resolve it against the configured page size.
    pub limit: usize,
    pub filters: Vec<FilterCondition>,
    pub sorts: Vec<SortCondition>,
    pub search: String,
    generation: u64,
}

impl QueryState {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn set_pagination(&mut self, pagination: Pagination) {
        self.offset = pagination.offset;
        self.limit = pagination.limit;
        self.bump();
    }

    pub fn set_filters(&mut self, filters: Vec<FilterCondition>) {
        self.filters = filters;
        self.reset_to_first_page();
    }

    /// Stores `sorts` ordered by ascending priority.
    pub fn set_sorts(&mut self, mut sorts: Vec<SortCondition>) {
        sorts.sort_by_key(|sort| sort.priority);
        self.sorts = sorts;
        self.reset_to_first_page();
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.reset_to_first_page();
    }

    pub fn effective_limit(&self, default_limit: usize) -> usize {
        if self.limit == 0 {
            default_limit
        } else {
            self.limit
        }
    }

    /// Request for the current page.
    pub fn to_request(&self, default_limit: usize) -> DataRequest {
        self.request_at(self.offset, self.effective_limit(default_limit))
    }

    /// Request for an arbitrary slice under the current filters, sorts and search.
    pub fn request_at(&self, offset: usize, limit: usize) -> DataRequest {
        DataRequest {
            offset,
            limit,
            filters: self.filters.clone(),
            sorts: self.sorts.clone(),
            global_search: (!self.search.is_empty()).then(|| self.search.clone()),
        }
    }

    fn reset_to_first_page(&mut self) {
        self.offset = 0;
        self.bump();
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataset_sdk::{FilterOperator, SortDirection};

    fn paged() -> QueryState {
        let mut query = QueryState::new(100);
        query.set_pagination(Pagination::page(4, 100));
        assert_eq!(query.offset, 400);
        query
    }

    #[test]
    fn filter_sort_and_search_edits_return_to_first_page() {
        let mut query = paged();
        query.set_filters(vec![FilterCondition::new(
            "country",
            FilterOperator::Eq,
            12,
        )]);
        assert_eq!(query.offset, 0);

        let mut query = paged();
        query.set_sorts(vec![SortCondition::new("name", SortDirection::Asc, 1)]);
        assert_eq!(query.offset, 0);

        let mut query = paged();
        query.set_search("ali");
        assert_eq!(query.offset, 0);
        assert_eq!(query.limit, 100);
    }

    #[test]
    fn every_setter_advances_generation() {
        let mut query = QueryState::new(10);
        let start = query.generation();
        query.set_pagination(Pagination::new(10, 10));
        query.set_filters(Vec::new());
        query.set_sorts(Vec::new());
        query.set_search("");
        assert_eq!(query.generation(), start + 4);
    }

    #[test]
    fn sorts_are_kept_in_priority_order() {
        let mut query = QueryState::new(10);
        query.set_sorts(vec![
            SortCondition::new("count", SortDirection::Desc, 3),
            SortCondition::new("name", SortDirection::Asc, 1),
        ]);
        let columns: Vec<_> = query.sorts.iter().map(|s| s.column.as_str()).collect();
        assert_eq!(columns, vec!["name", "count"]);
    }

    #[test]
    fn request_uses_default_limit_and_omits_empty_search() {
        let query = QueryState::new(0);
        let request = query.to_request(250);
        assert_eq!(request.limit, 250);
        assert_eq!(request.global_search, None);

        let mut query = QueryState::new(50);
        query.set_search("beta");
        let request = query.request_at(700, 25);
        assert_eq!((request.offset, request.limit), (700, 25));
        assert_eq!(request.global_search.as_deref(), Some("beta"));
    }
}
