//! Remote fetch capability handed to action handlers.

use std::time::Duration;

use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::BoxFuture;

/// Errors raised while fetching remote resources.
#[derive(Debug, Error)]
pub enum FetchError {
    /// No fetch implementation was configured for this context.
    #[error("Remote fetching is disabled")]
    Disabled,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Request to {0} timed out")]
    Timeout(String),

    #[error("Failed to decode response body: {0}")]
    Decode(String),
}

/// An outbound request made on behalf of an action handler.
#[derive(Clone, Debug)]
pub struct RemoteRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    /// Overrides the implementation's default timeout.
    pub timeout: Option<Duration>,
}

impl RemoteRequest {
    /// Create a request with no headers or body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a POST request with a JSON body.
    pub fn post_json<T: Serialize>(url: impl Into<String>, body: &T) -> Result<Self, FetchError> {
        let body = serde_json::to_vec(body).map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
        let mut request = Self::new(Method::POST, url);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.body = Some(body);
        Ok(request)
    }

    /// Append a header, rejecting invalid names or values.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, FetchError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
        let value =
            HeaderValue::from_str(value).map_err(|e| FetchError::InvalidRequest(e.to_string()))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Set the timeout for this request only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Response to a [`RemoteRequest`].
#[derive(Clone, Debug)]
pub struct RemoteResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RemoteResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body as UTF-8.
    pub fn text(&self) -> Result<String, FetchError> {
        String::from_utf8(self.body.clone()).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FetchError> {
        serde_json::from_slice(&self.body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Capability for making outbound calls from action handlers.
pub trait FetchRemote: Send + Sync {
    fn fetch(&self, request: RemoteRequest) -> BoxFuture<'static, Result<RemoteResponse, FetchError>>;
}

/// A [`FetchRemote`] that rejects every request.
///
/// Useful for addons that never reach out to remote services, and in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledFetchRemote;

impl FetchRemote for DisabledFetchRemote {
    fn fetch(&self, request: RemoteRequest) -> BoxFuture<'static, Result<RemoteResponse, FetchError>> {
        debug!("Rejected remote fetch to {}", request.url);
        Box::pin(async { Err(FetchError::Disabled) })
    }
}
