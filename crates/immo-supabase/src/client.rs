// SPDX-FileCopyrightText: 2026 Immo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the backend's PostgREST endpoints.
//!
//! Provides [`RestClient`] which handles URL construction, authentication
//! headers, PostgREST error payloads, and exact-count requests.

use std::time::Duration;

use immo_core::ImmoError;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::ApiErrorResponse;

/// Path prefix of the REST interface under the project URL.
const REST_PREFIX: &str = "rest/v1";

/// Filter parameters in PostgREST syntax, e.g. `("receiver_id", "eq.u1")`.
pub type Params<'a> = [(&'a str, String)];

/// HTTP client for PostgREST communication.
///
/// Every request carries the `apikey` header and a bearer token: the signed-in
/// user's access token when configured, otherwise the anonymous key.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RestClient {
    /// Creates a new client for the project at `base_url`.
    pub fn new(
        base_url: &str,
        anon_key: Option<&str>,
        access_token: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, ImmoError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = anon_key {
            headers.insert("apikey", header_value(key, "API key")?);
        }
        if let Some(token) = access_token.or(anon_key) {
            headers.insert(
                "authorization",
                header_value(&format!("Bearer {token}"), "access token")?,
            );
        }
        headers.insert("accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ImmoError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        // Validate once so request paths can be joined without re-checking.
        Url::parse(base_url)
            .map_err(|e| ImmoError::Config(format!("invalid backend URL `{base_url}`: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /rest/v1/{table}` returning every matching row.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &Params<'_>,
    ) -> Result<Vec<T>, ImmoError> {
        let url = self.endpoint(table, params)?;
        let response = self.send(self.client.get(url), table).await?;
        response.json::<Vec<T>>().await.map_err(|e| ImmoError::Backend {
            message: format!("failed to parse {table} rows: {e}"),
            status: None,
            source: Some(Box::new(e)),
        })
    }

    /// `PATCH /rest/v1/{table}` applying `body` to every row matching `filters`.
    pub async fn update<B: Serialize + ?Sized>(
        &self,
        table: &str,
        filters: &Params<'_>,
        body: &B,
    ) -> Result<(), ImmoError> {
        let url = self.endpoint(table, filters)?;
        let request = self
            .client
            .patch(url)
            .header("prefer", "return=minimal")
            .json(body);
        self.send(request, table).await.map(|_| ())
    }

    /// `POST /rest/v1/rpc/{function}` with named arguments.
    pub async fn rpc<B: Serialize + ?Sized>(&self, function: &str, args: &B) -> Result<(), ImmoError> {
        let url = self.endpoint(&format!("rpc/{function}"), &[])?;
        self.send(self.client.post(url).json(args), function)
            .await
            .map(|_| ())
    }

    /// `HEAD /rest/v1/{table}` with an exact count of matching rows.
    pub async fn count(&self, table: &str, filters: &Params<'_>) -> Result<usize, ImmoError> {
        let mut params: Vec<(&str, String)> = vec![("select", "id".to_string())];
        params.extend(filters.iter().cloned());
        let url = self.endpoint(table, &params)?;
        let request = self.client.head(url).header("prefer", "count=exact");
        let response = self.send(request, table).await?;

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| ImmoError::backend(format!("{table} count response has no total")))
    }

    /// Status of the REST root, used for health checks.
    pub async fn ping(&self) -> Result<StatusCode, ImmoError> {
        let url = self.endpoint("", &[])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e, "health check"))?;
        Ok(response.status())
    }

    fn endpoint(&self, path: &str, params: &Params<'_>) -> Result<Url, ImmoError> {
        let raw = format!("{}/{REST_PREFIX}/{path}", self.base_url);
        let mut url = Url::parse(&raw)
            .map_err(|e| ImmoError::Internal(format!("invalid endpoint `{raw}`: {e}")))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<reqwest::Response, ImmoError> {
        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(e, what))?;

        let status = response.status();
        debug!(status = %status, resource = what, "backend response received");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(api_err) => format!("{what}: {}", api_err.describe()),
            Err(_) => format!("{what}: backend returned {status}: {body}"),
        };
        if is_transient_error(status) {
            warn!(status = %status, resource = what, "transient backend error");
        }
        Err(ImmoError::Backend {
            message,
            status: Some(status.as_u16()),
            source: None,
        })
    }

    fn transport_error(&self, e: reqwest::Error, what: &str) -> ImmoError {
        if e.is_timeout() {
            return ImmoError::Timeout {
                duration: self.timeout,
            };
        }
        ImmoError::Backend {
            message: format!("{what}: HTTP request failed: {e}"),
            status: None,
            source: Some(Box::new(e)),
        }
    }
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue, ImmoError> {
    HeaderValue::from_str(value)
        .map_err(|e| ImmoError::Config(format!("invalid {what} header value: {e}")))
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
pub(crate) fn parse_content_range_total(value: &str) -> Option<usize> {
    value
        .rsplit_once('/')
        .and_then(|(_, total)| total.trim().parse().ok())
}

/// Returns true for HTTP status codes that indicate transient errors.
pub fn is_transient_error(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}
