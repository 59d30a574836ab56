//! Fetch coordination for the two channels that write into the window.
//!
//! Full refreshes replace the window and are mutually exclusive: a refresh
//! requested while another is in flight is dropped, not queued. Scroll loads
//! append to the window and are likewise limited to one in flight. Failures of
//! a full refresh are stored on the store for views to show; scroll-load
//! failures are only logged.
//!
//! Requests are never cancelled once issued. Each response is checked
//! against the query generation (and, for scroll loads, the window epoch)
//! captured when it was issued. A refresh that comes back for an outdated
//! query is discarded and re-issued for the latest query; an outdated scroll
//! page is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dataset_sdk::{DataRequest, DatasetService, FetchError, PageResult};
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::store::{StoreEvent, WindowStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchChannel {
    FullRefresh,
    ScrollLoad,
}

impl FetchChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchChannel::FullRefresh => "full_refresh",
            FetchChannel::ScrollLoad => "scroll_load",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    #[default]
    Idle,
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FetchStatus {
    pub full_refresh: ChannelStatus,
    pub scroll_load: ChannelStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Applied { len: usize, total: u64 },
    Failed(FetchError),
    /// Another refresh was already in flight.
    Dropped,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScrollOutcome {
    Appended {
        len: usize,
        total: u64,
        evicted: usize,
    },
    Failed(FetchError),
    /// Another scroll load was already in flight.
    Dropped,
    /// The query or the window changed while the page was in flight.
    Discarded,
}

/// Owns the dataset service and one in-flight flag per channel.
pub struct FetchCoordinator {
    service: Arc<dyn DatasetService>,
    full_refresh: Arc<AtomicBool>,
    scroll_load: Arc<AtomicBool>,
}

/// Marks a channel busy for as long as it lives.
#[must_use = "the channel is released when the guard drops"]
pub struct InFlightGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl FetchCoordinator {
    pub fn new(service: Arc<dyn DatasetService>) -> Self {
        Self {
            service,
            full_refresh: Arc::new(AtomicBool::new(false)),
            scroll_load: Arc::new(AtomicBool::new(false)),
        }
    }

    fn flag(&self, channel: FetchChannel) -> &Arc<AtomicBool> {
        match channel {
            FetchChannel::FullRefresh => &self.full_refresh,
            FetchChannel::ScrollLoad => &self.scroll_load,
        }
    }

    /// Claims `channel`, or returns `None` if it is already busy.
    pub fn try_begin(&self, channel: FetchChannel) -> Option<InFlightGuard> {
        let flag = self.flag(channel);
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: Arc::clone(flag),
            })
    }

    pub fn is_in_flight(&self, channel: FetchChannel) -> bool {
        self.flag(channel).load(Ordering::Acquire)
    }

    pub fn status(&self) -> FetchStatus {
        let status = |channel: FetchChannel| {
            if self.is_in_flight(channel) {
                ChannelStatus::InFlight
            } else {
                ChannelStatus::Idle
            }
        };
        FetchStatus {
            full_refresh: status(FetchChannel::FullRefresh),
            scroll_load: status(FetchChannel::ScrollLoad),
        }
    }

    pub async fn fetch(
        &self,
        channel: FetchChannel,
        request: &DataRequest,
    ) -> Result<PageResult, FetchError> {
        let result = self.service.fetch_page(request).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(FetchError::Network(_)) => "network_error",
            Err(FetchError::HttpStatus { .. }) => "http_status_error",
            Err(FetchError::Decode(_)) => "decode_error",
        };
        counter!(
            "window_store_fetch_total",
            1,
            "channel" => channel.as_str(),
            "outcome" => outcome
        );
        result
    }
}

impl WindowStore {
    /// Re-fetches the current page and replaces the window with it.
    ///
    /// Dropped when a refresh is already running. Clears the stored error up
    /// front, and stores the new one if the request fails; the window is left
    /// untouched on failure.
    pub async fn full_refresh(&self) -> RefreshOutcome {
        let Some(guard) = self.inner.coordinator.try_begin(FetchChannel::FullRefresh) else {
            debug!("full refresh already in flight; dropping request");
            counter!("window_store_refresh_dropped_total", 1);
            self.publish(StoreEvent::RefreshDropped);
            return RefreshOutcome::Dropped;
        };
        let outcome = self.run_full_refresh().await;
        drop(guard);
        self.publish(StoreEvent::FetchSettled {
            channel: FetchChannel::FullRefresh,
        });
        outcome
    }

    async fn run_full_refresh(&self) -> RefreshOutcome {
        let page_size = self.inner.config.page_size;
        loop {
            let (request, generation) = {
                let mut state = self.lock();
                state.error = None;
                (state.query.to_request(page_size), state.query.generation())
            };
            self.publish(StoreEvent::FetchStarted {
                channel: FetchChannel::FullRefresh,
                offset: request.offset,
                limit: request.limit,
            });

            let result = self
                .inner
                .coordinator
                .fetch(FetchChannel::FullRefresh, &request)
                .await;

            let applied = {
                let mut state = self.lock();
                if state.query.generation() != generation {
                    None
                } else {
                    Some(match result {
                        Ok(page) => {
                            state.cache.replace_all(page.data, page.total, request.offset);
                            Ok((state.cache.len(), state.cache.total()))
                        }
                        Err(err) => {
                            state.error = Some(err.clone());
                            Err(err)
                        }
                    })
                }
            };
            let Some(applied) = applied else {
                debug!(
                    issued = generation,
                    "query changed during full refresh; re-issuing"
                );
                self.publish(StoreEvent::StaleResponseDiscarded {
                    channel: FetchChannel::FullRefresh,
                });
                continue;
            };
            return match applied {
                Ok((len, total)) => {
                    info!(offset = request.offset, len, total, "window replaced");
                    self.publish(StoreEvent::WindowReplaced { len, total });
                    RefreshOutcome::Applied { len, total }
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        offset = request.offset,
                        limit = request.limit,
                        "full refresh failed"
                    );
                    self.publish(StoreEvent::RefreshFailed { error: err.clone() });
                    RefreshOutcome::Failed(err)
                }
            };
        }
    }

    /// Loads `limit` rows starting at dataset `offset` under the current
    /// filters, sorts and search, and appends them to the window.
    ///
    /// Failures are logged and otherwise ignored: the stored error and the
    /// window stay as they were.
    pub async fn scroll_load(&self, offset: usize, limit: usize) -> ScrollOutcome {
        let Some(guard) = self.inner.coordinator.try_begin(FetchChannel::ScrollLoad) else {
            debug!(offset, limit, "scroll load already in flight; dropping request");
            return ScrollOutcome::Dropped;
        };
        let (request, generation, epoch) = {
            let state = self.lock();
            (
                state.query.request_at(offset, limit),
                state.query.generation(),
                state.cache.epoch(),
            )
        };
        self.publish(StoreEvent::FetchStarted {
            channel: FetchChannel::ScrollLoad,
            offset,
            limit,
        });

        let result = self
            .inner
            .coordinator
            .fetch(FetchChannel::ScrollLoad, &request)
            .await;

        let outcome = {
            let mut state = self.lock();
            if state.query.generation() != generation || state.cache.epoch() != epoch {
                ScrollOutcome::Discarded
            } else {
                match result {
                    Ok(page) => {
                        let evicted = state.cache.append_windowed(page.data, limit, page.total);
                        ScrollOutcome::Appended {
                            len: state.cache.len(),
                            total: state.cache.total(),
                            evicted,
                        }
                    }
                    Err(err) => ScrollOutcome::Failed(err),
                }
            }
        };
        drop(guard);

        match &outcome {
            ScrollOutcome::Appended {
                len,
                total,
                evicted,
            } => {
                if *evicted > 0 {
                    counter!("window_store_evicted_records_total", *evicted as u64);
                }
                debug!(offset, limit, len, total, evicted, "window extended");
                self.publish(StoreEvent::WindowAppended {
                    len: *len,
                    total: *total,
                    evicted: *evicted,
                });
            }
            ScrollOutcome::Failed(err) => {
                warn!(error = %err, offset, limit, "scroll load failed");
            }
            ScrollOutcome::Discarded => {
                debug!(offset, limit, "window moved during scroll load; discarding page");
                self.publish(StoreEvent::StaleResponseDiscarded {
                    channel: FetchChannel::ScrollLoad,
                });
            }
            ScrollOutcome::Dropped => {}
        }
        self.publish(StoreEvent::FetchSettled {
            channel: FetchChannel::ScrollLoad,
        });
        outcome
    }
}
