//! Network adapter
//!
//! Requests and responses are plain owned data so they can be cached and queued on disk.
//! [`HttpNetwork`] sends them with reqwest against one origin.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body served when neither the cache nor the network can answer.
pub const OFFLINE_BODY: &str = "เกิดข้อผิดพลาด: ไม่สามารถเชื่อมต่อได้";

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("cannot connect to {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: Method,
    /// Origin-relative (`/static/app.js`) or absolute URL.
    pub url: String,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Option<Vec<u8>>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post_json<T: Serialize>(url: impl Into<String>, body: &T) -> Result<Self, serde_json::Error> {
        let mut request = Self::new(Method::Post, url);
        request.body = Some(serde_json::to_vec(body)?);
        Ok(request.header("Content-Type", "application/json"))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }

    /// Path and query of the URL, without scheme and authority.
    pub fn path(&self) -> &str {
        match self.url.find("://") {
            Some(idx) => {
                let rest = &self.url[idx + 3..];
                rest.find('/').map(|slash| &rest[slash..]).unwrap_or("/")
            }
            None => &self.url,
        }
    }

    /// Whether the URL points at the client's own origin.
    pub fn is_same_origin(&self, origin: &str) -> bool {
        if !self.url.contains("://") {
            return true;
        }
        match self.url.strip_prefix(origin.trim_end_matches('/')) {
            Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
            None => false,
        }
    }
}

/// How a response was obtained, in the browser's fetch vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin
    Basic,
    /// Cross-origin
    Cors,
    /// Synthesized locally
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    #[serde(default)]
    pub body: Vec<u8>,
    pub kind: ResponseKind,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>, kind: ResponseKind) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
            kind,
        }
    }

    /// 503 served when both cache and network failed.
    pub fn offline() -> Self {
        let mut response = Self::new(503, OFFLINE_BODY, ResponseKind::Synthetic);
        response
            .headers
            .push(("Content-Type".to_string(), "text/plain; charset=UTF-8".to_string()));
        response
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only complete same-origin answers are worth caching.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseKind::Basic
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

/// reqwest-backed network bound to the client's origin.
#[derive(Clone)]
pub struct HttpNetwork {
    http_client: reqwest::Client,
    origin: String,
}

impl HttpNetwork {
    pub fn new(origin: impl Into<String>, timeout: Duration) -> Result<Self, NetworkError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            origin: origin.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn absolute_url(&self, request: &Request) -> String {
        if request.url.contains("://") {
            request.url.clone()
        } else {
            format!("{}{}", self.origin, request.url)
        }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let url = self.absolute_url(request);
        let mut builder = self.http_client.request(request.method.as_reqwest(), &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout { url: url.clone() }
            } else if e.is_builder() {
                NetworkError::InvalidRequest(e.to_string())
            } else {
                NetworkError::Unreachable {
                    url: url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let kind = if request.is_same_origin(&self.origin) {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        };
        let body = response
            .bytes()
            .await
            .map_err(|e| NetworkError::Unreachable {
                url: url.clone(),
                reason: e.to_string(),
            })?
            .to_vec();

        tracing::debug!(url = %url, status = status, size_bytes = body.len(), "Fetched");
        Ok(Response {
            status,
            headers,
            body,
            kind,
        })
    }
}
