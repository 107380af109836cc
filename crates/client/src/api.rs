//! HTTP contract with the warehouse backend.
//!
//! Each backend capability is its own trait so components depend only on the
//! slice they use (the probe only needs [`HealthCheck`], the submission
//! pipeline only [`OrderSender`]). [`HttpBackend`] implements all of them
//! over `reqwest`.

use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use vuzoll_cart::CatalogItem;
use vuzoll_core::ItemId;

use crate::types::{OrderRequest, OrderResponse, SearchHit, SearchResponse, ServerLogsResponse};

pub const HEALTH_PATH: &str = "/api/health";
pub const SEARCH_PATH: &str = "/api/search";
pub const GET_ITEM_PATH: &str = "/api/get_item";
pub const SUBMIT_ORDER_PATH: &str = "/api/submit_order";
pub const LOGS_PATH: &str = "/api/logs";

/// Header that makes the tunnel skip its interstitial browser warning page.
pub const TUNNEL_BYPASS_HEADER: &str = "ngrok-skip-browser-warning";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("unexpected content type: {0}")]
    UnexpectedContent(String),
    #[error("parse error: {0}")]
    Parse(String),
    /// The backend understood the request and refused it.
    #[error("{0}")]
    Rejected(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BackendError::Timeout
        } else if err.is_decode() {
            BackendError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            BackendError::Status(status.as_u16())
        } else {
            BackendError::Network(err.to_string())
        }
    }
}

#[async_trait::async_trait]
pub trait HealthCheck: Send + Sync {
    /// `Ok` only for a 2xx answer from the health endpoint.
    async fn health(&self) -> Result<(), BackendError>;
}

#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, BackendError>;

    async fn get_item(&self, id: &ItemId) -> Result<CatalogItem, BackendError>;
}

#[async_trait::async_trait]
pub trait OrderSender: Send + Sync {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, BackendError>;
}

#[async_trait::async_trait]
pub trait ServerLogs: Send + Sync {
    async fn fetch_logs(&self) -> Result<String, BackendError>;
}

/// Everything the session needs from the backend.
pub trait Backend: HealthCheck + Catalog + OrderSender + ServerLogs {}

impl<T> Backend for T where T: HealthCheck + Catalog + OrderSender + ServerLogs {}

/// `/api/get_item` answers either the item or `{error}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum GetItemBody {
    Error { error: String },
    Item(CatalogItem),
}

/// `reqwest`-backed implementation of the backend contract.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
}

impl HttpBackend {
    /// Build a client carrying the fixed header set and a per-request timeout.
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(TUNNEL_BYPASS_HEADER),
            HeaderValue::from_static("true"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

#[async_trait::async_trait]
impl HealthCheck for HttpBackend {
    async fn health(&self) -> Result<(), BackendError> {
        let resp = self.client.get(self.url(HEALTH_PATH)).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Status(resp.status().as_u16()))
        }
    }
}

#[async_trait::async_trait]
impl Catalog for HttpBackend {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, BackendError> {
        let resp = self
            .client
            .get(self.url(SEARCH_PATH))
            .query(&[("q", query)])
            .send()
            .await?;
        let body: SearchResponse = read_json(resp).await?;
        Ok(body.results)
    }

    async fn get_item(&self, id: &ItemId) -> Result<CatalogItem, BackendError> {
        let resp = self
            .client
            .get(self.url(GET_ITEM_PATH))
            .query(&[("id", id.as_str())])
            .send()
            .await?;
        match read_json::<GetItemBody>(resp).await? {
            GetItemBody::Error { error } => Err(BackendError::Rejected(error)),
            GetItemBody::Item(item) => Ok(item),
        }
    }
}

#[async_trait::async_trait]
impl OrderSender for HttpBackend {
    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderResponse, BackendError> {
        let resp = self
            .client
            .post(self.url(SUBMIT_ORDER_PATH))
            .json(order)
            .send()
            .await?;
        read_json(resp).await
    }
}

#[async_trait::async_trait]
impl ServerLogs for HttpBackend {
    async fn fetch_logs(&self) -> Result<String, BackendError> {
        let resp = self.client.get(self.url(LOGS_PATH)).send().await?;
        let body: ServerLogsResponse = read_json(resp).await?;
        Ok(body.logs)
    }
}

/// Decode a JSON body, refusing anything that is not labelled as JSON.
///
/// Tunnels answer with an HTML warning page (status 200) when they cannot
/// reach the backend, so the content type is checked before parsing. A
/// non-2xx answer with a JSON body is still decoded: the backend reports
/// refusals that way.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_json_content_type(&content_type) {
        return Err(if status.is_success() {
            BackendError::UnexpectedContent(content_type)
        } else {
            BackendError::Status(status.as_u16())
        });
    }

    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| {
        if status.is_success() {
            BackendError::Parse(e.to_string())
        } else {
            BackendError::Status(status.as_u16())
        }
    })
}

fn is_json_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_content_type_detection() {
        assert!(is_json_content_type("application/json"));
        assert!(is_json_content_type("application/json; charset=utf-8"));
        assert!(is_json_content_type("application/problem+json"));
        assert!(!is_json_content_type("text/html; charset=utf-8"));
        assert!(!is_json_content_type(""));
    }

    #[test]
    fn get_item_body_prefers_error_shape() {
        let body: GetItemBody = serde_json::from_str(r#"{"error":"not found"}"#).unwrap();
        assert!(matches!(body, GetItemBody::Error { error } if error == "not found"));

        let body: GetItemBody =
            serde_json::from_str(r#"{"id":"A1","name":"Bolt","quantity":3,"location":"R1"}"#).unwrap();
        assert!(matches!(body, GetItemBody::Item(item) if item.quantity == 3));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let backend = HttpBackend::new("https://example.test/", Duration::from_secs(1)).unwrap();
        assert_eq!(backend.url(HEALTH_PATH), "https://example.test/api/health");
    }
}
