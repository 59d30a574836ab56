//! Window Store: a bounded client-side window over a remote, paginated,
//! filterable and sortable dataset.
//!
//! Responsibilities:
//! - holding the current query (page, filters, sorts, free-text search)
//! - replacing the window on query changes and extending it on scroll
//! - keeping at most `max_records` rows resident while scrolling
//! - coalescing rapid filter/sort/search edits before they reach the network
//! - publishing every state transition to subscribers

pub mod cache;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod fetch;
pub mod query;
pub mod scroll;
pub mod store;

pub use cache::WindowCache;
pub use config::{ConfigError, StoreConfig};
pub use controller::QueryController;
pub use debounce::Debouncer;
pub use fetch::{
    ChannelStatus, FetchChannel, FetchCoordinator, FetchStatus, RefreshOutcome, ScrollOutcome,
};
pub use query::{Pagination, QueryState};
pub use scroll::{ScrollGeometry, ScrollRequest, ScrollTrigger, WindowView};
pub use store::{StoreEvent, StoreSnapshot, WindowStore};
