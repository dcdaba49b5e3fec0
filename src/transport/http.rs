//! HTTPS transport implementation.
//!
//! This module provides the `reqwest`-backed transport used on the device.

use futures::future::BoxFuture;

use crate::error::Result;
use crate::protocol::ResponseBuffer;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// HTTPS transport over a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport around an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>> {
        Box::pin(async move {
            let builder = match request.body {
                Some(body) => self
                    .client
                    .post(&request.url)
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(body),
                None => self.client.get(&request.url),
            };

            tracing::trace!("{} request", request.method.as_str());

            // Errors carry the URL by default, which embeds the credential
            let mut response = builder
                .timeout(request.timeout)
                .send()
                .await
                .map_err(reqwest::Error::without_url)?;
            let status = response.status().as_u16();

            // Stream into the bounded buffer; stop reading once it overflows
            let mut body = ResponseBuffer::with_capacity(request.response_capacity);
            while let Some(chunk) = response.chunk().await.map_err(reqwest::Error::without_url)? {
                if !body.append(&chunk) {
                    tracing::warn!("{} response truncated", request.method.as_str());
                    break;
                }
            }

            tracing::trace!(
                "{} response: status {}, {} bytes",
                request.method.as_str(),
                status,
                body.len()
            );

            Ok(HttpResponse { status, body })
        })
    }
}
