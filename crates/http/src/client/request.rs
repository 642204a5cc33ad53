//! Outgoing requests and raw responses

use super::error::ClientError;
use bytes::Bytes;
use folio_core::Envelope;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Message used when a failed response does not explain itself
pub const DEFAULT_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Which dispatch of a request this is
///
/// A request is refreshed-and-retried at most once; a `Retried` request that
/// receives another `401` is returned to the caller as is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Attempt {
    #[default]
    FirstAttempt,
    Retried,
}

/// An API call captured with everything needed to replay it once
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Value>,
    attempt: Attempt,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
            attempt: Attempt::FirstAttempt,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add an extra header sent on every dispatch
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub const fn attempt(&self) -> Attempt {
        self.attempt
    }

    /// The same request, marked as already retried
    pub fn into_retry(self) -> Self {
        Self {
            attempt: Attempt::Retried,
            ..self
        }
    }
}

/// A response as received from the backend
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
}

impl ApiResponse {
    pub const fn new(status: StatusCode, body: Bytes) -> Self {
        Self { status, body }
    }

    pub const fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decode the body as the backend's response envelope
    ///
    /// An empty body (e.g. `204 No Content`) yields an empty, successful envelope.
    pub fn envelope<T: DeserializeOwned>(&self) -> Result<Envelope<T>, ClientError> {
        if self.body.is_empty() {
            return Ok(Envelope {
                success: self.status.is_success(),
                data: None,
                message: None,
            });
        }
        self.json()
    }

    /// Message from the body's `message` field, else its `error` field
    pub fn declared_message(&self) -> Option<String> {
        let body = serde_json::from_slice::<Value>(&self.body).ok()?;
        ["message", "error"].iter().find_map(|field| {
            body.get(field)
                .and_then(Value::as_str)
                .filter(|message| !message.is_empty())
                .map(str::to_string)
        })
    }

    /// Error message declared by the body, or a generic default
    pub fn error_message(&self) -> String {
        self.declared_message()
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
    }

    /// Pass 2xx responses through, turn everything else into a typed failure
    pub fn into_result(self) -> Result<Self, ClientError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ClientError::from_status(self.status, self.error_message()))
        }
    }
}
