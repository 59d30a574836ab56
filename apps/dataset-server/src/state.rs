use std::sync::Arc;
use std::time::Instant;

use dataset_sdk::InMemoryDatasetService;

#[derive(Clone)]
pub struct AppState {
    start: Instant,
    dataset: Arc<InMemoryDatasetService>,
    seed_records: usize,
}

impl AppState {
    pub fn new(dataset: Arc<InMemoryDatasetService>, seed_records: usize) -> Self {
        Self {
            start: Instant::now(),
            dataset,
            seed_records,
        }
    }

    pub fn dataset(&self) -> &Arc<InMemoryDatasetService> {
        &self.dataset
    }

    pub fn seed_records(&self) -> usize {
        self.seed_records
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }
}
