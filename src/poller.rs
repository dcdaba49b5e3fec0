//! Long-poll receive loop.
//!
//! The [`Poller`] owns the acknowledgment state exclusively. Each cycle
//! issues one `getUpdates` call with `offset = last_acked_id + 1`, which
//! acknowledges everything below it on the server side, then forwards
//! accepted text messages to the inbound queue without ever blocking on it
//! for longer than the configured enqueue wait.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use crate::auth::authorize;
use crate::backoff::{PollPhase, PollState};
use crate::config::{BridgeSettings, ChannelConfig};
use crate::error::{Error, Result};
use crate::protocol::{
    ApiMethod, GetUpdates, TextMessage, decode_updates, extract_max_update_id, first_update_id,
};
use crate::transport::{HttpRequest, HttpResponse, Transport};
use crate::types::InboundMessage;

/// Result of a successful poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The body decoded normally.
    Updates {
        /// Number of updates in the response.
        received: usize,
        /// Number of messages pushed onto the inbound queue.
        forwarded: usize,
    },
    /// The body was truncated; the acknowledgment point was moved to the
    /// largest id found in the raw text and the content was skipped.
    Recovered { update_id: i64 },
}

/// Receive side of the bridge.
pub struct Poller<T> {
    transport: Arc<T>,
    config: Arc<ChannelConfig>,
    settings: Arc<BridgeSettings>,
    inbound: mpsc::Sender<InboundMessage>,
    state: PollState,
}

impl<T: Transport> Poller<T> {
    /// Creates a poller with fresh state.
    #[must_use]
    pub fn new(
        transport: Arc<T>,
        config: Arc<ChannelConfig>,
        settings: Arc<BridgeSettings>,
        inbound: mpsc::Sender<InboundMessage>,
    ) -> Self {
        Self {
            transport,
            config,
            settings,
            inbound,
            state: PollState::new(),
        }
    }

    /// Returns the acknowledgment and failure state.
    #[must_use]
    pub const fn state(&self) -> &PollState {
        &self.state
    }

    /// Runs the poll loop until the inbound queue's receiver is dropped.
    ///
    /// Pending updates from before this boot are flushed first.
    pub async fn run(mut self) {
        tracing::info!("polling task started");

        self.flush_pending().await;

        loop {
            if self.inbound.is_closed() {
                tracing::info!("inbound queue closed, polling task exiting");
                return;
            }

            if self.config.is_configured() {
                if let PollPhase::Backoff(delay) = self.cycle().await {
                    tracing::debug!("backing off for {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                }
            } else {
                tokio::time::sleep(self.settings.unconfigured_delay).await;
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }

    /// Runs one poll cycle and records its outcome.
    ///
    /// Returns the next phase of the loop: keep polling, or back off first.
    pub async fn cycle(&mut self) -> PollPhase {
        match self.poll_once().await {
            Ok(outcome) => {
                tracing::trace!("poll cycle: {:?}", outcome);
                self.state.record_success()
            }
            Err(e) => {
                let phase = self.state.record_failure(&self.settings.backoff);
                tracing::warn!(
                    "poll failed ({} consecutive): {}",
                    self.state.consecutive_failures(),
                    e
                );
                phase
            }
        }
    }

    /// Acknowledges every update pending at startup without processing it.
    ///
    /// Step 1 asks for the newest pending update (`offset=-1`, no wait).
    /// Step 2 requests `offset = id + 1`, which the server treats as an
    /// acknowledgment of everything up to `id`. Commands sent while the
    /// device was off are dropped instead of replayed.
    pub async fn flush_pending(&mut self) {
        let Some(credential) = self.config.credential() else {
            return;
        };
        let credential = credential.expose().to_owned();

        let latest = GetUpdates::latest().url(&self.settings.api_base, &credential);
        let response = match self.request(latest, self.settings.request_timeout).await {
            Ok(response) if response.is_ok() => response,
            Ok(response) => {
                tracing::warn!("flush step 1 failed (status={})", response.status);
                return;
            }
            Err(e) => {
                tracing::warn!("flush step 1 failed: {}", e);
                return;
            }
        };

        let pending = if response.body.is_truncated() {
            let recovered = extract_max_update_id(response.body.as_bytes());
            tracing::warn!("flush step 1 response truncated, recovered {:?}", recovered);
            recovered
        } else {
            first_update_id(response.body.as_bytes())
        };

        let last_id = match pending {
            Some(id) if id != 0 => id,
            _ => {
                tracing::info!("no pending updates to flush");
                return;
            }
        };

        let confirm = GetUpdates::acknowledge(last_id.saturating_add(1))
            .url(&self.settings.api_base, &credential);
        match self.request(confirm, self.settings.request_timeout).await {
            Ok(response) => tracing::info!(
                "flushed pending updates up to {} (confirm status={})",
                last_id,
                response.status
            ),
            Err(e) => tracing::info!(
                "flushed pending updates up to {} (confirm failed: {})",
                last_id,
                e
            ),
        }

        self.state.acknowledge(last_id);
    }

    /// Runs one receive cycle.
    ///
    /// Succeeds on any `ok` response, including one with no updates, and on
    /// a truncated response from which an update id could be recovered.
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        let credential = self.config.credential().ok_or(Error::NotConfigured)?;
        let url = GetUpdates::poll(self.state.next_offset(), self.settings.poll_timeout.as_secs())
            .url(&self.settings.api_base, credential.expose());

        let response = self
            .request(url, self.settings.poll_request_timeout())
            .await?;

        if !response.is_ok() {
            return Err(Error::Status {
                method: ApiMethod::GetUpdates.as_str(),
                status: response.status,
                body: response.body.text_lossy(),
            });
        }

        if response.body.is_truncated() {
            let Some(update_id) = extract_max_update_id(response.body.as_bytes()) else {
                tracing::error!("truncated response without parseable update_id");
                return Err(Error::Truncated);
            };
            self.state.acknowledge(update_id);
            tracing::warn!(
                "recovered from truncated response, skipping to update_id={}",
                self.state.last_acked_id()
            );
            return Ok(PollOutcome::Recovered { update_id });
        }

        let updates = decode_updates(response.body.as_bytes())?;
        let received = updates.len();
        let mut forwarded = 0;

        for update in updates {
            if let Some(id) = update.update_id {
                self.state.acknowledge(id);
            }
            if let Some(message) = update.message {
                if self.forward(message).await {
                    forwarded += 1;
                }
            }
        }

        Ok(PollOutcome::Updates {
            received,
            forwarded,
        })
    }

    /// Authorizes and enqueues one message. Returns true if it was queued.
    async fn forward(&self, message: TextMessage) -> bool {
        if !authorize(self.config.peer_id(), message.chat_id).is_accepted() {
            return false;
        }

        let inbound = InboundMessage::new(&message.text, self.settings.inbound_text_capacity);
        tracing::info!("received: {}", inbound.text());

        match self
            .inbound
            .send_timeout(inbound, self.settings.inbound_send_timeout)
            .await
        {
            Ok(()) => true,
            Err(SendTimeoutError::Timeout(_)) => {
                tracing::warn!("inbound queue full, message dropped");
                false
            }
            Err(SendTimeoutError::Closed(_)) => {
                tracing::warn!("inbound queue closed, message dropped");
                false
            }
        }
    }

    async fn request(
        &self,
        url: String,
        timeout: std::time::Duration,
    ) -> Result<HttpResponse> {
        self.transport
            .execute(HttpRequest {
                method: ApiMethod::GetUpdates,
                url,
                body: None,
                timeout,
                response_capacity: self.settings.response_capacity,
            })
            .await
    }
}
