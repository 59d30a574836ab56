//! Bounded, ordered window over the remote dataset.
//!
//! A full refresh replaces the window verbatim. Scroll loads append to the
//! tail and, once the window is full, slide it forward by dropping the
//! oldest rows so that at most `capacity` rows stay resident.

use dataset_sdk::Record;

#[derive(Debug, Clone)]
pub struct WindowCache {
    items: Vec<Record>,
    capacity: usize,
    total: u64,
    window_start: usize,
    epoch: u64,
}

impl WindowCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
            total: 0,
            window_start: 0,
            epoch: 0,
        }
    }

    /// Installs a fresh page. Capacity is not applied here.
    pub fn replace_all(&mut self, data: Vec<Record>, total: u64, window_start: usize) {
        self.items = data;
        self.total = total;
        self.window_start = window_start;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Appends a scroll-loaded page and returns how many rows were evicted.
    ///
    /// When the window is already full, only the newest `capacity - limit`
    /// rows are kept before appending. If the page itself overshoots the
    /// capacity the oldest rows are dropped afterwards as well, so the window
    /// never ends up larger than `capacity`.
    pub fn append_windowed(&mut self, data: Vec<Record>, limit: usize, total: u64) -> usize {
        let mut evicted = 0;
        if self.items.len() >= self.capacity {
            let keep = self.capacity.saturating_sub(limit);
            evicted += self.evict_front(self.items.len() - keep);
        }
        self.items.extend(data);
        if self.items.len() > self.capacity {
            evicted += self.evict_front(self.items.len() - self.capacity);
        }
        self.total = total;
        evicted
    }

    fn evict_front(&mut self, count: usize) -> usize {
        let count = count.min(self.items.len());
        self.items.drain(..count);
        self.window_start += count;
        count
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total matching rows last reported by the service.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Dataset offset of the first resident row.
    pub fn window_start(&self) -> usize {
        self.window_start
    }

    /// Dataset offset just past the last resident row.
    pub fn window_end(&self) -> usize {
        self.window_start + self.items.len()
    }

    /// Incremented on every full replacement.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(range: std::ops::Range<i64>) -> Vec<Record> {
        range.map(Record::new).collect()
    }

    fn ids(cache: &WindowCache) -> Vec<i64> {
        cache.items().iter().map(|r| r.id).collect()
    }

    #[test]
    fn replace_keeps_oversized_pages_verbatim() {
        let mut cache = WindowCache::new(3);
        cache.replace_all(rows(0..5), 5, 0);
        assert_eq!(cache.len(), 5);
        assert_eq!(cache.epoch(), 1);
    }

    #[test]
    fn appends_without_eviction_until_full() {
        let mut cache = WindowCache::new(3000);
        cache.replace_all(rows(0..1000), 5000, 0);
        assert_eq!(cache.append_windowed(rows(1000..2000), 1000, 5000), 0);
        assert_eq!(cache.append_windowed(rows(2000..3000), 1000, 5000), 0);
        assert_eq!(cache.len(), 3000);
        assert_eq!(cache.window_end(), 3000);
    }

    #[test]
    fn full_window_slides_forward() {
        let mut cache = WindowCache::new(3000);
        cache.replace_all(rows(0..3000), 5000, 0);
        let evicted = cache.append_windowed(rows(3000..4000), 1000, 5000);

        assert_eq!(evicted, 1000);
        assert_eq!(cache.len(), 3000);
        let expected: Vec<i64> = (1000..4000).collect();
        assert_eq!(ids(&cache), expected);
        assert_eq!(cache.window_start(), 1000);
        assert_eq!(cache.window_end(), 4000);
        assert!((cache.window_end() as u64) < cache.total());
    }

    #[test]
    fn limit_larger_than_capacity_clamps_instead_of_underflowing() {
        let mut cache = WindowCache::new(3);
        cache.replace_all(rows(0..3), 100, 0);
        let evicted = cache.append_windowed(rows(3..8), 5, 100);
        assert_eq!(cache.len(), 3);
        assert_eq!(ids(&cache), vec![5, 6, 7]);
        assert_eq!(evicted, 5);
        assert_eq!(cache.window_start(), 5);
    }

    #[test]
    fn partial_window_never_overshoots_capacity() {
        let mut cache = WindowCache::new(4);
        cache.replace_all(rows(0..3), 10, 0);
        cache.append_windowed(rows(3..6), 3, 10);
        assert_eq!(ids(&cache), vec![2, 3, 4, 5]);
        assert!(cache.len() <= cache.capacity());
    }

    #[test]
    fn reports_end_of_dataset() {
        let mut cache = WindowCache::new(10);
        cache.replace_all(rows(0..4), 6, 0);
        assert!((cache.window_end() as u64) < cache.total());
        cache.append_windowed(rows(4..6), 4, 6);
        assert_eq!(cache.window_end() as u64, cache.total());
    }
}
