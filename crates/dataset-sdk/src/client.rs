//! HTTP client for a remote dataset service.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::service::{DatasetService, FetchError};
use crate::{DataRequest, PageResult};

#[derive(Clone)]
pub struct HttpDatasetService {
    http: Client,
    base_url: Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResponse {
    pub message: String,
}

impl HttpDatasetService {
    pub fn new(mut base_url: Url) -> Self {
        // Url::join replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            http: Client::new(),
            base_url,
        }
    }

    pub fn parse(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(base_url)?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Asks the service to (re)seed its dataset.
    pub async fn init_dataset(&self, force: bool) -> Result<InitResponse, FetchError> {
        let mut url = self.endpoint("init_db")?;
        url.query_pairs_mut()
            .append_pair("force", if force { "true" } else { "false" });
        let res = self.http.post(url).send().await.map_err(network)?;
        decode_response(res).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url
            .join(path)
            .map_err(|err| FetchError::Network(format!("invalid dataset url: {err}")))
    }
}

#[async_trait]
impl DatasetService for HttpDatasetService {
    async fn fetch_page(&self, request: &DataRequest) -> Result<PageResult, FetchError> {
        let url = self.endpoint("data")?;
        debug!(
            %url,
            offset = request.offset,
            limit = request.limit,
            filters = request.filters.len(),
            sorts = request.sorts.len(),
            "requesting dataset page"
        );
        let res = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(network)?;
        decode_response(res).await
    }
}

async fn decode_response<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, FetchError> {
    let status = res.status();
    let body = res.bytes().await.map_err(network)?;
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    serde_json::from_slice(&body).map_err(|err| FetchError::Decode(err.to_string()))
}

/// Prefers the `detail` field of a JSON error body, falling back to the raw text.
fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(other) => other.to_string(),
            None => String::from_utf8_lossy(body).into_owned(),
        },
        _ => String::from_utf8_lossy(body).into_owned(),
    }
}

fn network(err: reqwest::Error) -> FetchError {
    FetchError::Network(err.to_string())
}
