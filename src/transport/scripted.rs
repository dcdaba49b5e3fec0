//! Scripted transport for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::protocol::ResponseBuffer;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with a status and body; the body is cut to the request's capacity.
    Status(u16, Vec<u8>),
    /// Fail before a response arrives.
    Fail,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Self::Status(200, body.as_bytes().to_vec())
    }
}

/// Returns scripted replies in order and records every request.
///
/// Once the script runs out, `fallback` is used.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
    fallback: Reply,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
            fallback: Reply::Fail,
        }
    }

    pub fn with_fallback(mut self, fallback: Reply) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse>> {
        Box::pin(async move {
            let capacity = request.response_capacity;
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());

            match reply {
                Reply::Status(status, body) => {
                    let mut buffer = ResponseBuffer::with_capacity(capacity);
                    buffer.append(&body);
                    Ok(HttpResponse {
                        status,
                        body: buffer,
                    })
                }
                Reply::Fail => Err(Error::protocol("scripted transport failure")),
            }
        })
    }
}
