//! HTTP transport seam used by the network-backed sources.
//!
//! Sources build an [`HttpRequest`] and hand it to an [`HttpClient`]; the
//! production implementation is [`ReqwestHttpClient`], tests plug in
//! [`CannedHttpClient`].

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::data_source::SourceError;

/// Per-request timeout applied when a source does not set one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("marketfeed/", env!("CARGO_PKG_VERSION"));

/// Boxed future returned by [`HttpClient::execute`].
pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Credential placement for outgoing requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpAuth {
    None,
    Header { name: String, value: String },
    QueryParam { name: String, value: String },
}

impl HttpAuth {
    pub fn apply(&self, request: &mut HttpRequest) {
        match self {
            Self::None => {}
            Self::Header { name, value } => {
                request
                    .headers
                    .insert(name.to_ascii_lowercase(), value.clone());
            }
            Self::QueryParam { name, value } => {
                request.query.push((name.clone(), value.clone()));
            }
        }
    }
}

/// GET request envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: BTreeMap::new(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_auth(mut self, auth: &HttpAuth) -> Self {
        auth.apply(&mut self);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL with the query string appended, parameters percent-encoded in
    /// insertion order.
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(name, value)| {
                format!(
                    "{}={}",
                    urlencoding::encode(name),
                    urlencoding::encode(value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}{query}", self.url)
    }
}

/// Response envelope returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub const fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, SourceError> {
        serde_json::from_str(&self.body)
            .map_err(|error| SourceError::malformed(format!("invalid JSON payload: {error}")))
    }
}

/// Transport failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Body,
    Other,
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    kind: HttpErrorKind,
    message: String,
}

impl HttpError {
    pub fn new(kind: HttpErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(HttpErrorKind::Other, message)
    }

    pub const fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

impl From<HttpError> for SourceError {
    fn from(value: HttpError) -> Self {
        SourceError::unavailable(value.message)
    }
}

/// Transport contract used by network-backed sources.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Production HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(USER_AGENT)
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut builder = self
                .client
                .get(&request.url)
                .query(&request.query)
                .timeout(request.timeout);

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::new(HttpErrorKind::Timeout, format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(HttpErrorKind::Connect, format!("connection failed: {e}"))
                } else {
                    HttpError::other(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| {
                HttpError::new(
                    HttpErrorKind::Body,
                    format!("failed to read response body: {e}"),
                )
            })?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// Offline transport answering from canned responses.
///
/// Routes are matched by URL prefix in registration order; unmatched
/// requests get a 404. Every request is recorded.
#[derive(Debug, Default, Clone)]
pub struct CannedHttpClient {
    routes: Arc<Mutex<Vec<(String, Result<HttpResponse, HttpError>)>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl CannedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url_prefix: impl Into<String>, response: HttpResponse) -> Self {
        self.push_route(url_prefix.into(), Ok(response));
        self
    }

    pub fn fail(self, url_prefix: impl Into<String>, error: HttpError) -> Self {
        self.push_route(url_prefix.into(), Err(error));
        self
    }

    /// Requests seen so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn push_route(&self, prefix: String, outcome: Result<HttpResponse, HttpError>) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((prefix, outcome));
    }

    fn answer(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = request.full_url();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, outcome)| outcome.clone())
            .unwrap_or_else(|| Ok(HttpResponse::new(404, "")))
    }
}

impl HttpClient for CannedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        let outcome = self.answer(request);
        Box::pin(async move { outcome })
    }
}
