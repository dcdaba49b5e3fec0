//! Request builders for the bot API.
//!
//! Every call is addressed as `<api_base><credential>/<method>`.

use bytes::Bytes;
use serde_json::json;

use crate::error::Result;

/// API method names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    /// Long-poll receive.
    GetUpdates,
    /// Outbound text delivery.
    SendMessage,
}

impl ApiMethod {
    /// Returns the method's path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetUpdates => "getUpdates",
            Self::SendMessage => "sendMessage",
        }
    }
}

/// Builds the URL for `method` without a query string.
#[must_use]
pub fn method_url(api_base: &str, credential: &str, method: ApiMethod) -> String {
    format!("{api_base}{credential}/{}", method.as_str())
}

/// Query parameters for a `getUpdates` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetUpdates {
    /// First update id to return; acknowledges everything below it.
    /// `-1` asks for the newest pending update only.
    pub offset: i64,
    /// Maximum number of updates returned.
    pub limit: u32,
    /// Long-poll wait in seconds; 0 returns immediately.
    pub timeout_secs: u64,
}

impl GetUpdates {
    /// Regular long-poll request starting at `offset`.
    #[must_use]
    pub const fn poll(offset: i64, timeout_secs: u64) -> Self {
        Self {
            offset,
            limit: 1,
            timeout_secs,
        }
    }

    /// Non-blocking request for the newest pending update.
    #[must_use]
    pub const fn latest() -> Self {
        Self::acknowledge(-1)
    }

    /// Non-blocking request that acknowledges everything below `offset`.
    #[must_use]
    pub const fn acknowledge(offset: i64) -> Self {
        Self {
            offset,
            limit: 1,
            timeout_secs: 0,
        }
    }

    /// Builds the full request URL.
    #[must_use]
    pub fn url(&self, api_base: &str, credential: &str) -> String {
        format!(
            "{}?timeout={}&limit={}&offset={}",
            method_url(api_base, credential, ApiMethod::GetUpdates),
            self.timeout_secs,
            self.limit,
            self.offset
        )
    }
}

/// Encodes a `sendMessage` body: `{"chat_id": <int>, "text": <string>}`.
pub fn encode_send_message(chat_id: i64, text: &str) -> Result<Bytes> {
    let body = serde_json::to_vec(&json!({
        "chat_id": chat_id,
        "text": text,
    }))?;
    Ok(Bytes::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.example.org/bot";

    #[test]
    fn test_poll_url() {
        let url = GetUpdates::poll(43, 30).url(BASE, "123:abc");
        assert_eq!(
            url,
            "https://api.example.org/bot123:abc/getUpdates?timeout=30&limit=1&offset=43"
        );
    }

    #[test]
    fn test_flush_urls() {
        assert!(GetUpdates::latest().url(BASE, "t").ends_with("timeout=0&limit=1&offset=-1"));
        assert!(
            GetUpdates::acknowledge(43)
                .url(BASE, "t")
                .ends_with("timeout=0&limit=1&offset=43")
        );
    }

    #[test]
    fn test_send_message_body() {
        let body = encode_send_message(-1_001_234, "hi \"there\"").unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["chat_id"], -1_001_234);
        assert_eq!(value["text"], "hi \"there\"");
    }
}
