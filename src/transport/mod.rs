//! Transport layer for bot API calls.
//!
//! This module provides the abstraction the poller and sender issue their
//! requests through. [`HttpTransport`] talks HTTPS; tests substitute a
//! scripted implementation.

pub mod http;
#[cfg(test)]
pub(crate) mod scripted;

use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::protocol::{ApiMethod, ResponseBuffer};

/// One HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// API method, used for logging instead of the credential-bearing URL.
    pub method: ApiMethod,
    /// Full request URL.
    pub url: String,
    /// JSON body; `None` issues a GET, `Some` a POST.
    pub body: Option<Bytes>,
    /// Local transport timeout for the whole exchange.
    pub timeout: Duration,
    /// Maximum number of response body bytes kept.
    pub response_capacity: usize,
}

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, possibly truncated.
    pub body: ResponseBuffer,
}

impl HttpResponse {
    /// Returns true for HTTP 200.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Trait for transport implementations.
pub trait Transport: Send + Sync {
    /// Performs one request.
    ///
    /// Only failures to complete the exchange are errors; any status code
    /// is returned as a response.
    fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>>;
}

pub use http::HttpTransport;
