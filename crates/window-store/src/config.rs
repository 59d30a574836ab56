use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_MAX_RECORDS: usize = 3_000;
pub const DEFAULT_PAGE_SIZE: usize = 1_000;
pub const DEFAULT_FILTER_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_SORT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 500;
pub const DEFAULT_NEAR_BOTTOM_PX: f64 = 100.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Upper bound on resident records after a scroll load.
    pub max_records: usize,
    /// Page size used when the query does not carry a limit.
    pub page_size: usize,
    pub filter_debounce: Duration,
    pub sort_debounce: Duration,
    pub search_debounce: Duration,
    pub near_bottom_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("max_records must be positive")]
    ZeroCapacity,
    #[error("page_size must be positive")]
    ZeroPageSize,
    #[error("near_bottom_threshold must be a non-negative number, got {0}")]
    InvalidThreshold(f64),
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_records = env_parse("WINDOW_MAX_RECORDS").unwrap_or(defaults.max_records);
        let page_size = env_parse("WINDOW_PAGE_SIZE").unwrap_or(defaults.page_size);
        let filter_debounce = env_parse("WINDOW_FILTER_DEBOUNCE_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.filter_debounce);
        let sort_debounce = env_parse("WINDOW_SORT_DEBOUNCE_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.sort_debounce);
        let search_debounce = env_parse("WINDOW_SEARCH_DEBOUNCE_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.search_debounce);
        let near_bottom_threshold =
            env_parse("WINDOW_NEAR_BOTTOM_PX").unwrap_or(defaults.near_bottom_threshold);
        Self {
            max_records,
            page_size,
            filter_debounce,
            sort_debounce,
            search_debounce,
            near_bottom_threshold,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_records == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if !self.near_bottom_threshold.is_finite() || self.near_bottom_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.near_bottom_threshold));
        }
        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            page_size: DEFAULT_PAGE_SIZE,
            filter_debounce: Duration::from_millis(DEFAULT_FILTER_DEBOUNCE_MS),
            sort_debounce: Duration::from_millis(DEFAULT_SORT_DEBOUNCE_MS),
            search_debounce: Duration::from_millis(DEFAULT_SEARCH_DEBOUNCE_MS),
            near_bottom_threshold: DEFAULT_NEAR_BOTTOM_PX,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
