use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::fetch::{ChannelStatus, FetchStatus};

/// Viewport measurements reported by the host on every scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollGeometry {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollGeometry {
    pub fn new(scroll_top: f64, scroll_height: f64, client_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            client_height,
        }
    }

    /// Distance left to scroll before hitting the bottom.
    pub fn remaining(&self) -> f64 {
        self.scroll_height - (self.scroll_top + self.client_height)
    }
}

/// The slice of store state the trigger looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowView {
    pub window_end: usize,
    pub total: u64,
    pub status: FetchStatus,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub offset: usize,
    pub limit: usize,
}

/// Stateless near-bottom detector. Safe to evaluate on every scroll event:
/// it stays quiet while a fetch is running or once the window reaches the
/// end of the dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollTrigger {
    threshold: f64,
    default_limit: usize,
}

impl ScrollTrigger {
    pub fn new(threshold: f64, default_limit: usize) -> Self {
        Self {
            threshold,
            default_limit,
        }
    }

    /// The returned `offset` is the dataset position just past the resident
    /// window, so pages already evicted from the front are never re-requested.
    pub fn evaluate(&self, geometry: &ScrollGeometry, view: &WindowView) -> Option<ScrollRequest> {
        // NaN geometry compares as None and never counts as near the bottom.
        if geometry.remaining().partial_cmp(&self.threshold) != Some(Ordering::Less) {
            return None;
        }
        if view.status.full_refresh == ChannelStatus::InFlight
            || view.status.scroll_load == ChannelStatus::InFlight
        {
            return None;
        }
        if view.window_end as u64 >= view.total {
            return None;
        }
        let limit = if view.limit == 0 {
            self.default_limit
        } else {
            view.limit
        };
        Some(ScrollRequest {
            offset: view.window_end,
            limit,
        })
    }
}
