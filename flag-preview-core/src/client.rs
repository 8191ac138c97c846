//! # client: Contentstack delivery API transport
//!
//! [`DeliveryApi`] is the seam between the preview pipeline and the network.
//! Lookup, fetch and the request handler only ever talk to this trait, so they
//! can be driven by the real [`ContentstackClient`] or by a `mockall` mock.
//!
//! ## Contract
//! - Every call is a single GET; nothing is retried.
//! - Transport failures and timeouts become [`PreviewError::Transport`].
//! - Non-2xx responses become [`PreviewError::FetchFailed`] carrying the raw body
//!   (listing failures become [`PreviewError::DiscoveryUnavailable`]).
//! - Bodies that are not JSON become [`PreviewError::Decode`].
//!
//! Clients are built per request from explicit [`Credentials`]; there is no
//! process-wide client.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::error::PreviewError;
use crate::model::{ContentTypeSummary, Credentials};

pub const DEFAULT_BASE_URL: &str = "https://cdn.contentstack.io/v3";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Read-only access to the delivery API of one stack.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DeliveryApi: Send + Sync {
    /// List every content type published to `environment`, in API order.
    async fn list_content_types(
        &self,
        environment: &str,
    ) -> Result<Vec<ContentTypeSummary>, PreviewError>;

    /// Fetch the definition of a single content type.
    async fn get_content_type(
        &self,
        content_type: &str,
        environment: &str,
    ) -> Result<ContentTypeSummary, PreviewError>;

    /// Fetch one entry; returns the whole response body (`{"entry": {...}}`).
    async fn get_entry(
        &self,
        content_type: &str,
        entry_id: &str,
        environment: &str,
        preview: bool,
    ) -> Result<Value, PreviewError>;

    /// Fetch one asset; returns the whole response body (`{"asset": {...}}`).
    async fn get_asset(&self, asset_id: &str, environment: &str) -> Result<Value, PreviewError>;
}

#[derive(Debug, Deserialize)]
struct ContentTypeList {
    #[serde(default)]
    content_types: Vec<ContentTypeSummary>,
}

#[derive(Debug, Deserialize)]
struct ContentTypeEnvelope {
    content_type: ContentTypeSummary,
}

/// `reqwest`-backed [`DeliveryApi`] for the Contentstack CDN.
pub struct ContentstackClient {
    client: Client,
    base_url: Url,
}

impl ContentstackClient {
    /// Build a client against the public CDN with the default timeout.
    pub fn new(credentials: &Credentials) -> Result<Self, PreviewError> {
        Self::with_base_url(credentials, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    pub fn with_base_url(
        credentials: &Credentials,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, PreviewError> {
        credentials.validate()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| PreviewError::Configuration {
                missing: format!("valid delivery base_url ({base_url}: {e})"),
            })?;
        if base_url.cannot_be_a_base() {
            return Err(PreviewError::Configuration {
                missing: format!("hierarchical delivery base_url ({base_url})"),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("api_key"),
            secret_header(&credentials.api_key, "apiKey")?,
        );
        headers.insert(
            HeaderName::from_static("access_token"),
            secret_header(&credentials.delivery_token, "deliveryToken")?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PreviewError::Transport(format!("failed to build HTTP client: {e}")))?;

        tracing::debug!(
            base_url = %base_url,
            environment = %credentials.environment,
            timeout_ms = timeout.as_millis() as u64,
            "Initialized Contentstack delivery client"
        );

        Ok(Self { client, base_url })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Issue one GET and return `(status, body)` without interpreting the status.
    async fn get(&self, url: Url, query: &[(&str, &str)]) -> Result<(u16, String), PreviewError> {
        tracing::debug!(url = %url, "GET delivery API");
        let response = self.client.get(url.clone()).query(query).send().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Delivery API request failed");
            PreviewError::from(e)
        })?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// GET a document and decode it, mapping non-2xx to [`PreviewError::FetchFailed`].
    async fn get_document(&self, url: Url, query: &[(&str, &str)]) -> Result<Value, PreviewError> {
        let (status_code, raw_body) = self.get(url.clone(), query).await?;
        if !(200..300).contains(&status_code) {
            tracing::warn!(status_code, url = %url, "Delivery API returned error status");
            return Err(PreviewError::FetchFailed {
                status_code,
                raw_body,
            });
        }
        Ok(serde_json::from_str(&raw_body)?)
    }
}

fn secret_header(value: &str, field: &str) -> Result<HeaderValue, PreviewError> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| PreviewError::Validation(format!("{field} is not a valid header value")))?;
    value.set_sensitive(true);
    Ok(value)
}

#[async_trait]
impl DeliveryApi for ContentstackClient {
    async fn list_content_types(
        &self,
        environment: &str,
    ) -> Result<Vec<ContentTypeSummary>, PreviewError> {
        let url = self.url(&["content_types"]);
        let (status_code, raw_body) = self.get(url, &[("environment", environment)]).await?;
        if !(200..300).contains(&status_code) {
            return Err(PreviewError::DiscoveryUnavailable { status_code });
        }
        let listing: ContentTypeList = serde_json::from_str(&raw_body)?;
        tracing::debug!(
            environment,
            count = listing.content_types.len(),
            "Listed content types"
        );
        Ok(listing.content_types)
    }

    async fn get_content_type(
        &self,
        content_type: &str,
        environment: &str,
    ) -> Result<ContentTypeSummary, PreviewError> {
        let url = self.url(&["content_types", content_type]);
        let document = self
            .get_document(url, &[("environment", environment)])
            .await?;
        let envelope: ContentTypeEnvelope = serde_json::from_value(document)?;
        Ok(envelope.content_type)
    }

    async fn get_entry(
        &self,
        content_type: &str,
        entry_id: &str,
        environment: &str,
        preview: bool,
    ) -> Result<Value, PreviewError> {
        let url = self.url(&["content_types", content_type, "entries", entry_id]);
        let mut query = vec![("environment", environment)];
        if preview {
            query.push(("preview", "true"));
        }
        self.get_document(url, &query).await
    }

    async fn get_asset(&self, asset_id: &str, environment: &str) -> Result<Value, PreviewError> {
        let url = self.url(&["assets", asset_id]);
        self.get_document(url, &[("environment", environment)]).await
    }
}
