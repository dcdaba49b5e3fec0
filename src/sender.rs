//! Outbound delivery.
//!
//! Delivery is at-most-once: each queued message gets exactly one send
//! attempt, in queue order, and a failure is logged and forgotten.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::{BridgeSettings, ChannelConfig};
use crate::error::{Error, Result};
use crate::protocol::{ApiMethod, encode_send_message, method_url};
use crate::transport::{HttpRequest, Transport};
use crate::types::OutboundMessage;

/// Greeting sent when the device comes back online.
pub const STARTUP_GREETING: &str = "I'm back online. What can I help you with?";

/// Send side of the bridge.
pub struct MessageSender<T> {
    transport: Arc<T>,
    config: Arc<ChannelConfig>,
    settings: Arc<BridgeSettings>,
}

impl<T> Clone for MessageSender<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<T: Transport> MessageSender<T> {
    /// Creates a sender.
    #[must_use]
    pub const fn new(
        transport: Arc<T>,
        config: Arc<ChannelConfig>,
        settings: Arc<BridgeSettings>,
    ) -> Self {
        Self {
            transport,
            config,
            settings,
        }
    }

    /// Delivers `text` to the provisioned peer.
    ///
    /// Returns [`Error::NotConfigured`] without touching the network if no
    /// credential or peer id is loaded.
    pub async fn send(&self, text: &str) -> Result<()> {
        let Some(credential) = self.config.credential() else {
            tracing::warn!("cannot send - not configured");
            return Err(Error::NotConfigured);
        };
        let peer_id = self.config.peer_id();
        if peer_id == 0 {
            tracing::warn!("cannot send - no peer id");
            return Err(Error::NotConfigured);
        }

        let body = encode_send_message(peer_id, text)?;
        let response = self
            .transport
            .execute(HttpRequest {
                method: ApiMethod::SendMessage,
                url: method_url(
                    &self.settings.api_base,
                    credential.expose(),
                    ApiMethod::SendMessage,
                ),
                body: Some(body),
                timeout: self.settings.request_timeout,
                response_capacity: self.settings.response_capacity,
            })
            .await?;

        if !response.is_ok() {
            let body = response.body.text_lossy();
            tracing::error!("sendMessage failed: {}", response.status);
            if !body.is_empty() {
                tracing::error!("sendMessage response: {}", body);
            }
            return Err(Error::Status {
                method: ApiMethod::SendMessage.as_str(),
                status: response.status,
                body,
            });
        }

        Ok(())
    }

    /// Sends the startup greeting.
    pub async fn send_startup(&self) -> Result<()> {
        self.send(STARTUP_GREETING).await
    }

    /// Drains `outbound` until every producer is gone.
    ///
    /// Messages are sent one at a time in queue order. When the channel is
    /// unconfigured they are discarded unsent.
    pub async fn run(self, mut outbound: mpsc::Receiver<OutboundMessage>) {
        tracing::info!("send task started");

        while let Some(message) = outbound.recv().await {
            if !self.config.is_configured() || self.config.peer_id() == 0 {
                tracing::debug!("discarding outbound message - not configured");
                continue;
            }

            if let Err(e) = self.send(message.text()).await {
                tracing::warn!("outbound message dropped: {}", e);
            }
        }

        tracing::info!("outbound queue closed, send task exiting");
    }
}
