//! HTTP transport for GA4GH `<resource>/search` endpoints.
//!
//! Every GA4GH search is a `POST` of a camelCase JSON body holding the filter
//! plus `pageSize`/`pageToken`, answered with a list field and `nextPageToken`.

use std::fmt;
use std::time::Duration;

use paging_verify::{PageSize, PageToken, TransportError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Request timeout when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Error bodies longer than this are cut before they reach a report.
const MAX_ERROR_BODY: usize = 512;

/// Search request body: the filter fields followed by the paging fields.
///
/// Absent paging fields are left out of the body rather than sent as `null`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a, F: Serialize + ?Sized> {
    #[serde(flatten)]
    pub filter: &'a F,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'a str>,
}

impl<'a, F: Serialize + ?Sized> SearchRequest<'a, F> {
    pub fn new(
        filter: &'a F,
        page_size: Option<PageSize>,
        page_token: Option<&'a PageToken>,
    ) -> Self {
        Self {
            filter,
            page_size: page_size.map(PageSize::get),
            page_token: page_token.map(PageToken::as_str),
        }
    }
}

/// Handle on one GA4GH server. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Ga4ghClient {
    http: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl fmt::Debug for Ga4ghClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ga4ghClient")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Ga4ghClient {
    /// Create a client for the server rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "Invalid endpoint '{base_url}'. Expected an http:// or https:// URL"
            ));
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            bearer_token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a path below the base.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a search body and decode the JSON response.
    pub async fn post_search<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, TransportError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url(path);
        tracing::debug!("POST {url}");

        let mut request = self.http.post(&url).json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| map_error(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                url,
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        let bytes = response.bytes().await.map_err(|e| map_error(&url, e))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

fn map_error(url: &str, err: reqwest::Error) -> TransportError {
    let url = url.to_string();
    if err.is_timeout() {
        TransportError::Timeout { url }
    } else if err.is_decode() {
        TransportError::Decode {
            url,
            message: err.to_string(),
        }
    } else {
        TransportError::Request {
            url,
            message: err.to_string(),
        }
    }
}

fn truncate(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
