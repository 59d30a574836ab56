use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::query::{run_query, DatasetError, DEFAULT_SEARCH_COLUMNS};
use crate::{DataRequest, PageResult, Record};

/// Failure of one dataset request. None of these are retried by callers in
/// this workspace; the next user action issues a fresh request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected status: {status} detail={message}")]
    HttpStatus { status: u16, message: String },
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[async_trait]
pub trait DatasetService: Send + Sync {
    async fn fetch_page(&self, request: &DataRequest) -> Result<PageResult, FetchError>;
}

/// Dataset held in process memory. Backs the local dataset server and tests.
pub struct InMemoryDatasetService {
    records: RwLock<Vec<Record>>,
    search_columns: Vec<String>,
}

impl InMemoryDatasetService {
    pub fn new(records: Vec<Record>) -> Arc<Self> {
        Arc::new(Self::with_search_columns(records, DEFAULT_SEARCH_COLUMNS))
    }

    pub fn with_search_columns<S: Into<String>>(
        records: Vec<Record>,
        columns: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            records: RwLock::new(records),
            search_columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn replace_records(&self, records: Vec<Record>) {
        *self.records.write().await = records;
    }

    pub async fn query(&self, request: &DataRequest) -> Result<PageResult, DatasetError> {
        let records = self.records.read().await;
        run_query(&records, request, &self.search_columns)
    }
}

impl Default for InMemoryDatasetService {
    fn default() -> Self {
        Self::with_search_columns(Vec::new(), DEFAULT_SEARCH_COLUMNS)
    }
}

#[async_trait]
impl DatasetService for InMemoryDatasetService {
    async fn fetch_page(&self, request: &DataRequest) -> Result<PageResult, FetchError> {
        // Invalid queries surface the way the HTTP server reports them.
        self.query(request).await.map_err(|err| FetchError::HttpStatus {
            status: 400,
            message: err.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterCondition, FilterOperator};

    fn numbered(count: i64) -> Vec<Record> {
        (1..=count)
            .map(|id| Record::new(id).with_field("name", format!("row-{id}")))
            .collect()
    }

    #[tokio::test]
    async fn pages_through_records() {
        let service = InMemoryDatasetService::new(numbered(25));
        let page = service
            .fetch_page(&DataRequest::page(20, 10))
            .await
            .unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0].id, 21);
    }

    #[tokio::test]
    async fn invalid_filters_map_to_bad_request() {
        let service = InMemoryDatasetService::new(numbered(3));
        let mut request = DataRequest::page(0, 10);
        request
            .filters
            .push(FilterCondition::new("id", FilterOperator::NotIn, 2));
        let err = service.fetch_page(&request).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn replaces_records() {
        let service = InMemoryDatasetService::new(numbered(3));
        service.replace_records(numbered(9)).await;
        assert_eq!(service.len().await, 9);
    }
}
