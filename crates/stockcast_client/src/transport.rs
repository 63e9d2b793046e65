use std::time::Duration;

use client_logging::{client_debug, client_warn};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ApiError, ErrorKind};

/// Shared read-only transport configuration. Built once, cloned freely;
/// per-call overrides live on [`RequestSpec`] and never leak back here.
#[derive(Debug, Clone)]
pub struct TransportSettings {
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            request_timeout: Duration::from_millis(30_000),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }
}

/// One request, immutable per call.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    /// Overrides the transport's default request timeout for this call only.
    pub timeout: Option<Duration>,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Seam for the HTTP transport, so callers and tests can substitute doubles.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, spec: &RequestSpec) -> Result<Value, ApiError>;
}

/// The reqwest-backed transport. Holds shared client configuration only;
/// sending the same spec twice never mutates it.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    settings: TransportSettings,
}

impl HttpTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|err| ApiError::new(ErrorKind::Network, err.to_string()))?;

        Ok(Self { client, settings })
    }

    pub fn with_defaults() -> Result<Self, ApiError> {
        Self::new(TransportSettings::default())
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    fn build_url(&self, spec: &RequestSpec) -> String {
        let base = self.settings.base_url.trim_end_matches('/');
        let path = spec.path.trim_start_matches('/');
        format!("{base}/{path}")
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn send(&self, spec: &RequestSpec) -> Result<Value, ApiError> {
        let url = self.build_url(spec);
        client_debug!("API request {} {}", spec.method.as_str(), url);

        let mut request = match spec.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !spec.query.is_empty() {
            request = request.query(&spec.query);
        }
        if let Some(body) = &spec.body {
            request = request.json(body);
        }
        if let Some(timeout) = spec.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|err| {
            client_warn!("API network failure for {} {}: {}", spec.method.as_str(), url, err);
            ApiError::network()
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let err = normalize_status_error(status, &body);
            client_warn!(
                "API error {} for {} {}: {}",
                status.as_u16(),
                spec.method.as_str(),
                url,
                err.message
            );
            return Err(err);
        }

        let body = response
            .bytes()
            .await
            .map_err(|_| ApiError::network())?;
        let value = serde_json::from_slice::<Value>(&body)
            .map_err(|err| ApiError::parse(format!("invalid response body: {err}")))?;
        client_debug!("API response {} for {} {}", status.as_u16(), spec.method.as_str(), url);
        Ok(value)
    }
}

/// Maps a non-success status plus raw body bytes into the closed taxonomy.
///
/// Message selection rule: body `detail` field, else body `error` field,
/// else the HTTP status line text.
fn normalize_status_error(status: reqwest::StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("detail")
                .or_else(|| value.get("error"))
                .and_then(|field| field.as_str().map(ToOwned::to_owned))
        })
        .unwrap_or_else(|| status.to_string());

    let kind = if status.is_client_error() {
        ErrorKind::Client(status.as_u16())
    } else {
        ErrorKind::Server(status.as_u16())
    };
    ApiError::new(kind, message)
}

/// Decodes a raw JSON value into a typed response, normalizing failures.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|err| ApiError::parse(format!("unexpected response shape: {err}")))
}
