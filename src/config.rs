//! Channel provisioning and runtime settings.
//!
//! [`ChannelConfig`] holds the two provisioned values read once from the
//! device's key-value store. [`BridgeSettings`] holds the tunables, all with
//! defaults matching the deployed firmware.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::backoff::Backoff;
use crate::protocol::DEFAULT_RESPONSE_CAPACITY;

/// Store key of the bot credential.
pub const CREDENTIAL_KEY: &str = "tg_token";

/// Store key of the authorized peer (chat) id.
pub const PEER_ID_KEY: &str = "tg_chat_id";

/// Maximum credential length in bytes.
pub const MAX_CREDENTIAL_LEN: usize = 63;

/// Default API base; the credential and method name are appended.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org/bot";

/// Default long-poll wait window.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default local margin added to the long-poll wait.
pub const DEFAULT_POLL_MARGIN: Duration = Duration::from_secs(10);

/// Default delay between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default re-check delay while no credential is loaded.
pub const DEFAULT_UNCONFIGURED_DELAY: Duration = Duration::from_secs(10);

/// Default timeout for send and flush requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default wait for room on the inbound queue before dropping a message.
pub const DEFAULT_INBOUND_SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// Default inbound message text limit in bytes.
pub const DEFAULT_INBOUND_TEXT_CAPACITY: usize = 512;

/// Default outbound message text limit in bytes.
pub const DEFAULT_OUTBOUND_TEXT_CAPACITY: usize = 4096;

/// Read-only access to the device's persistent key-value store.
pub trait KeyValueStore {
    /// Returns the string stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of [`MemoryStore::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Bot credential embedded in every request path.
///
/// `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Validates a raw credential: non-empty and at most
    /// [`MAX_CREDENTIAL_LEN`] bytes.
    #[must_use]
    pub fn new(raw: &str) -> Option<Self> {
        if raw.is_empty() || raw.len() > MAX_CREDENTIAL_LEN {
            return None;
        }
        Some(Self(raw.to_owned()))
    }

    /// Returns the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Provisioned channel identity. Loaded once, never written back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelConfig {
    credential: Option<Credential>,
    peer_id: i64,
}

impl ChannelConfig {
    /// Creates a config from already validated values.
    #[must_use]
    pub const fn new(credential: Option<Credential>, peer_id: i64) -> Self {
        Self {
            credential,
            peer_id,
        }
    }

    /// Loads the credential and peer id from `store`.
    ///
    /// A missing or invalid credential leaves the channel unconfigured; an
    /// unparsable peer id leaves it unprovisioned (`0`). Neither is an error.
    pub fn load(store: &impl KeyValueStore) -> Self {
        let credential = match store.get(CREDENTIAL_KEY) {
            Some(raw) => {
                let credential = Credential::new(&raw);
                if credential.is_none() {
                    tracing::warn!(
                        "invalid credential in store ({} bytes, max {})",
                        raw.len(),
                        MAX_CREDENTIAL_LEN
                    );
                }
                credential
            }
            None => {
                tracing::warn!("no credential configured");
                None
            }
        };

        let peer_id = match store.get(PEER_ID_KEY) {
            Some(raw) => {
                if let Some(id) = parse_peer_id(&raw) {
                    tracing::info!("loaded peer id: {}", id);
                    id
                } else {
                    tracing::warn!("invalid peer id in store: '{}'", raw);
                    0
                }
            }
            None => 0,
        };

        Self {
            credential,
            peer_id,
        }
    }

    /// Returns true once a credential is loaded.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    /// Returns the credential, if loaded.
    #[must_use]
    pub const fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    /// Returns the authorized peer id, or `0` if unprovisioned.
    #[must_use]
    pub const fn peer_id(&self) -> i64 {
        self.peer_id
    }
}

/// Parses a stored peer id.
///
/// Surrounding whitespace and a leading sign are accepted. Empty input,
/// trailing garbage, overflow, and zero all yield `None`.
#[must_use]
pub fn parse_peer_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|&id| id != 0)
}

/// Runtime tunables.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    /// API base URL; the credential and method are appended.
    pub api_base: String,
    /// Long-poll wait window requested from the server.
    pub poll_timeout: Duration,
    /// Local margin added to `poll_timeout` for the transport timeout.
    pub poll_margin: Duration,
    /// Delay between poll cycles.
    pub poll_interval: Duration,
    /// Re-check delay while no credential is loaded.
    pub unconfigured_delay: Duration,
    /// Timeout for send and flush requests.
    pub request_timeout: Duration,
    /// Wait for room on the inbound queue before dropping.
    pub inbound_send_timeout: Duration,
    /// Response body limit in bytes.
    pub response_capacity: usize,
    /// Inbound message text limit in bytes.
    pub inbound_text_capacity: usize,
    /// Outbound message text limit in bytes.
    pub outbound_text_capacity: usize,
    /// Retry policy after failed poll cycles.
    pub backoff: Backoff,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_owned(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            poll_margin: DEFAULT_POLL_MARGIN,
            poll_interval: DEFAULT_POLL_INTERVAL,
            unconfigured_delay: DEFAULT_UNCONFIGURED_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            inbound_send_timeout: DEFAULT_INBOUND_SEND_TIMEOUT,
            response_capacity: DEFAULT_RESPONSE_CAPACITY,
            inbound_text_capacity: DEFAULT_INBOUND_TEXT_CAPACITY,
            outbound_text_capacity: DEFAULT_OUTBOUND_TEXT_CAPACITY,
            backoff: Backoff::default(),
        }
    }
}

impl BridgeSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the long-poll wait window.
    #[must_use]
    pub const fn poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Sets the delay between poll cycles.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the response body limit.
    #[must_use]
    pub const fn response_capacity(mut self, capacity: usize) -> Self {
        self.response_capacity = capacity;
        self
    }

    /// Sets the inbound message text limit.
    #[must_use]
    pub const fn inbound_text_capacity(mut self, capacity: usize) -> Self {
        self.inbound_text_capacity = capacity;
        self
    }

    /// Sets the outbound message text limit.
    #[must_use]
    pub const fn outbound_text_capacity(mut self, capacity: usize) -> Self {
        self.outbound_text_capacity = capacity;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Transport timeout for a long-poll request.
    #[must_use]
    pub fn poll_request_timeout(&self) -> Duration {
        self.poll_timeout + self.poll_margin
    }
}
