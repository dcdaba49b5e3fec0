//! Error types for the botlink library.

use thiserror::Error;

/// The main error type for botlink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error (connect, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding/decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("{method} returned status {status}")]
    Status {
        method: &'static str,
        status: u16,
        body: String,
    },

    /// The API answered with a body lacking the expected envelope.
    #[error("protocol error: {message}")]
    Protocol { message: String },

    /// The response was truncated and no update id could be recovered.
    #[error("truncated response without recoverable update_id")]
    Truncated,

    /// No credential or peer id is loaded.
    #[error("not configured")]
    NotConfigured,

    /// A queue handed to `start` is already closed.
    #[error("invalid {which} queue")]
    InvalidQueue { which: &'static str },

    /// Channel receive error.
    #[error("channel closed")]
    ChannelClosed,
}

impl Error {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

/// Result type alias for botlink operations.
pub type Result<T> = std::result::Result<T, Error>;
