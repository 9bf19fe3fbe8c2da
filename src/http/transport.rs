//! The single-request HTTP primitive every hosted model call goes through.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// A fully built outbound request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

/// What came back from the server, whatever the status.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    /// Shorthand for a response carrying `value` as an `application/json` body.
    pub fn json_body(status: StatusCode, value: &Value) -> Self {
        Self::new(status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(value.to_string())
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// True when the content-type header declares a JSON body.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .is_some_and(|ct| ct.contains("application/json"))
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// A failure to complete the HTTP exchange at all.
///
/// `code` is a short, stable identifier (`ECONNREFUSED`, `ETIMEDOUT`, ...)
/// suitable for diagnostics.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    code: Option<String>,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.into(),
            source: None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let code = error_code(&err);
        Self {
            code: code.map(str::to_string),
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Maps a reqwest failure onto a short error code.
fn error_code(err: &reqwest::Error) -> Option<&'static str> {
    if let Some(kind) = io_error_kind(err) {
        match kind {
            io::ErrorKind::ConnectionRefused => return Some("ECONNREFUSED"),
            io::ErrorKind::ConnectionReset => return Some("ECONNRESET"),
            io::ErrorKind::ConnectionAborted => return Some("ECONNABORTED"),
            io::ErrorKind::TimedOut => return Some("ETIMEDOUT"),
            io::ErrorKind::BrokenPipe => return Some("EPIPE"),
            _ => {}
        }
    }

    if err.is_timeout() {
        Some("ETIMEDOUT")
    } else if err.is_connect() {
        if err.to_string().contains("dns") || source_chain_mentions(err, "dns") {
            Some("ENOTFOUND")
        } else {
            Some("ECONNECT")
        }
    } else if err.is_redirect() {
        Some("EREDIRECT")
    } else if err.is_body() {
        Some("EBODY")
    } else if err.is_decode() {
        Some("EDECODE")
    } else if err.is_builder() {
        Some("EBUILDER")
    } else if err.is_request() {
        Some("EREQUEST")
    } else {
        None
    }
}

fn io_error_kind(err: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io_err) = inner.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = inner.source();
    }
    None
}

fn source_chain_mentions(err: &reqwest::Error, needle: &str) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        if inner.to_string().to_lowercase().contains(needle) {
            return true;
        }
        source = inner.source();
    }
    false
}

/// Sends one request and reports the response as-is.
///
/// Implementations must not turn non-2xx statuses into errors; only failures
/// to complete the exchange are reported as [`TransportError`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &Request) -> Result<Response, TransportError>;
}

/// [`Transport`] backed by a reqwest [`Client`].
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Wraps an existing reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client with this crate's User-Agent and an optional
    /// per-request timeout.
    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder().user_agent(concat!(
            "hosted-models-rs/",
            env!("HOSTED_MODELS_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::new(builder.build()?))
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &Request) -> Result<Response, TransportError> {
        debug!("{} {}...", request.method, request.url);

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        debug!("{} {} -> {}", request.method, request.url, status);

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
