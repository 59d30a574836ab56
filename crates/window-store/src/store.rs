use std::sync::Arc;

use dataset_sdk::{DatasetService, FetchError, FilterCondition, Record, SortCondition};
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::broadcast;
use tracing::debug;

use crate::cache::WindowCache;
use crate::config::{ConfigError, StoreConfig};
use crate::fetch::{FetchChannel, FetchCoordinator, FetchStatus, RefreshOutcome, ScrollOutcome};
use crate::query::{Pagination, QueryState};
use crate::scroll::{ScrollGeometry, ScrollTrigger, WindowView};

const EVENT_BUFFER: usize = 256;

/// Notifications published after each state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    QueryChanged {
        generation: u64,
    },
    FetchStarted {
        channel: FetchChannel,
        offset: usize,
        limit: usize,
    },
    WindowReplaced {
        len: usize,
        total: u64,
    },
    WindowAppended {
        len: usize,
        total: u64,
        evicted: usize,
    },
    RefreshFailed {
        error: FetchError,
    },
    RefreshDropped,
    StaleResponseDiscarded {
        channel: FetchChannel,
    },
    FetchSettled {
        channel: FetchChannel,
    },
}

/// Point-in-time copy of everything a view needs except the rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot {
    pub query: QueryState,
    pub len: usize,
    pub capacity: usize,
    pub total: u64,
    pub window_start: usize,
    pub status: FetchStatus,
    pub error: Option<FetchError>,
}

pub(crate) struct StoreState {
    pub(crate) query: QueryState,
    pub(crate) cache: WindowCache,
    pub(crate) error: Option<FetchError>,
}

pub(crate) struct StoreInner {
    pub(crate) config: StoreConfig,
    pub(crate) coordinator: FetchCoordinator,
    pub(crate) state: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
    trigger: ScrollTrigger,
}

/// Handle to one windowed view of a dataset.
///
/// Cloning is cheap and every clone observes the same state. The store starts
/// with an empty window, an empty query on the first page, and both fetch
/// channels idle. Only the store's own methods mutate it; readers take
/// snapshots or subscribe to [`StoreEvent`]s.
#[derive(Clone)]
pub struct WindowStore {
    pub(crate) inner: Arc<StoreInner>,
}

impl WindowStore {
    pub fn new(service: Arc<dyn DatasetService>, config: StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let state = StoreState {
            query: QueryState::new(config.page_size),
            cache: WindowCache::new(config.max_records),
            error: None,
        };
        let trigger = ScrollTrigger::new(config.near_bottom_threshold, config.page_size);
        Ok(Self {
            inner: Arc::new(StoreInner {
                config,
                coordinator: FetchCoordinator::new(service),
                state: Mutex::new(state),
                events,
                trigger,
            }),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.lock();
        StoreSnapshot {
            query: state.query.clone(),
            len: state.cache.len(),
            capacity: state.cache.capacity(),
            total: state.cache.total(),
            window_start: state.cache.window_start(),
            status: self.inner.coordinator.status(),
            error: state.error.clone(),
        }
    }

    pub fn items(&self) -> Vec<Record> {
        self.lock().cache.items().to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().cache.is_empty()
    }

    pub fn total(&self) -> u64 {
        self.lock().cache.total()
    }

    pub fn query(&self) -> QueryState {
        self.lock().query.clone()
    }

    pub fn error(&self) -> Option<FetchError> {
        self.lock().error.clone()
    }

    pub fn status(&self) -> FetchStatus {
        self.inner.coordinator.status()
    }

    /// Page navigation. Keeps the requested offset.
    pub async fn set_pagination(&self, pagination: Pagination) -> RefreshOutcome {
        self.mutate_query(|query| query.set_pagination(pagination));
        self.full_refresh().await
    }

    pub async fn set_filters(&self, filters: Vec<FilterCondition>) -> RefreshOutcome {
        self.mutate_query(|query| query.set_filters(filters));
        self.full_refresh().await
    }

    pub async fn set_sorts(&self, sorts: Vec<SortCondition>) -> RefreshOutcome {
        self.mutate_query(|query| query.set_sorts(sorts));
        self.full_refresh().await
    }

    pub async fn set_search(&self, search: String) -> RefreshOutcome {
        self.mutate_query(|query| query.set_search(search));
        self.full_refresh().await
    }

    /// Feeds one scroll event through the trigger and loads the next page
    /// when it fires. Returns `None` when nothing was requested.
    pub async fn on_scroll(&self, geometry: ScrollGeometry) -> Option<ScrollOutcome> {
        let view = {
            let state = self.lock();
            WindowView {
                window_end: state.cache.window_end(),
                total: state.cache.total(),
                status: self.inner.coordinator.status(),
                limit: state.query.limit,
            }
        };
        let request = self.inner.trigger.evaluate(&geometry, &view)?;
        Some(self.scroll_load(request.offset, request.limit).await)
    }

    fn mutate_query(&self, apply: impl FnOnce(&mut QueryState)) {
        let generation = {
            let mut state = self.lock();
            apply(&mut state.query);
            state.query.generation()
        };
        debug!(generation, "query changed");
        self.publish(StoreEvent::QueryChanged { generation });
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.inner.state.lock()
    }

    pub(crate) fn publish(&self, event: StoreEvent) {
        // No subscribers is not an error.
        let _ = self.inner.events.send(event);
    }
}
