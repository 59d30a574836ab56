use dataset_sdk::{FilterCondition, SortCondition};

use crate::debounce::Debouncer;
use crate::fetch::{RefreshOutcome, ScrollOutcome};
use crate::query::Pagination;
use crate::scroll::ScrollGeometry;
use crate::store::WindowStore;

/// UI-facing entry point: routes filter, sort and search edits through
/// their own debouncers and forwards page clicks and scroll events straight
/// to the store.
pub struct QueryController {
    store: WindowStore,
    filters: Debouncer<Vec<FilterCondition>>,
    sorts: Debouncer<Vec<SortCondition>>,
    search: Debouncer<String>,
}

impl QueryController {
    pub fn new(store: WindowStore) -> Self {
        let config = store.config().clone();
        let filters = {
            let store = store.clone();
            Debouncer::new("filters", config.filter_debounce, move |filters| {
                let store = store.clone();
                async move {
                    store.set_filters(filters).await;
                }
            })
        };
        let sorts = {
            let store = store.clone();
            Debouncer::new("sorts", config.sort_debounce, move |sorts| {
                let store = store.clone();
                async move {
                    store.set_sorts(sorts).await;
                }
            })
        };
        let search = {
            let store = store.clone();
            Debouncer::new("search", config.search_debounce, move |search| {
                let store = store.clone();
                async move {
                    store.set_search(search).await;
                }
            })
        };
        Self {
            store,
            filters,
            sorts,
            search,
        }
    }

    pub fn store(&self) -> &WindowStore {
        &self.store
    }

    pub fn edit_filters(&self, filters: Vec<FilterCondition>) {
        self.filters.schedule(filters);
    }

    pub fn edit_sorts(&self, sorts: Vec<SortCondition>) {
        self.sorts.schedule(sorts);
    }

    pub fn edit_search(&self, search: impl Into<String>) {
        self.search.schedule(search.into());
    }

    /// Page clicks are not debounced.
    pub async fn go_to_page(&self, pagination: Pagination) -> RefreshOutcome {
        self.store.set_pagination(pagination).await
    }

    pub async fn on_scroll(&self, geometry: ScrollGeometry) -> Option<ScrollOutcome> {
        self.store.on_scroll(geometry).await
    }

    /// Drops every edit still waiting out its quiet period.
    pub fn cancel_pending(&self) {
        self.filters.cancel_pending();
        self.sorts.cancel_pending();
        self.search.cancel_pending();
    }

    pub fn has_pending_edits(&self) -> bool {
        self.filters.is_pending() || self.sorts.is_pending() || self.search.is_pending()
    }
}
