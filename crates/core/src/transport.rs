//! Transport contract
//!
//! The HTTP client itself lives outside this crate. Anything that can turn a
//! [`Request`] into a [`Response`] can back the service, which keeps the core
//! independent of any particular HTTP stack and easy to test.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

/// Outbound request handed to the transport
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path relative to the account storage URL; empty for the account itself
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Response returned by the transport
///
/// Header lookups are case-insensitive. `body` is the decoded JSON document,
/// if the service sent one.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl Response {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Failure reported by the transport
///
/// `status` is `None` when no response was received at all (DNS, connect,
/// timeout).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Request failed{}: {message}", status_suffix(.status))]
pub struct TransportError {
    pub status: Option<StatusCode>,
    pub message: String,
}

fn status_suffix(status: &Option<StatusCode>) -> String {
    match status {
        Some(status) => format!(" with {status}"),
        None => String::new(),
    }
}

impl TransportError {
    /// Error for a request that never produced a response
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Error for a non-success response
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(StatusCode::NOT_FOUND)
    }
}

/// The HTTP capability the service depends on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request and wait for the response
    async fn execute(&self, request: Request) -> std::result::Result<Response, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn execute(&self, request: Request) -> std::result::Result<Response, TransportError> {
        (**self).execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::with_status(StatusCode::NOT_FOUND, "no such container");
        assert_eq!(
            err.to_string(),
            "Request failed with 404 Not Found: no such container"
        );
        assert!(err.is_not_found());

        let err = TransportError::network("connection refused");
        assert_eq!(err.to_string(), "Request failed: connection refused");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_transport_error_source_chain() {
        let err = TransportError::with_status(StatusCode::SERVICE_UNAVAILABLE, "try later");
        let dyn_err: &dyn std::error::Error = &err;
        assert!(dyn_err.source().is_none());
        assert_eq!(
            dyn_err.to_string(),
            "Request failed with 503 Service Unavailable: try later"
        );
    }

    #[test]
    fn test_request_builder() {
        let req = Request::new(Method::HEAD, "photos").with_query("format", "json");
        assert_eq!(req.method, Method::HEAD);
        assert_eq!(req.path, "photos");
        assert_eq!(req.query, vec![("format".to_string(), "json".to_string())]);
        assert!(req.body.is_none());
    }
}
