//! Main [`Bridge`] handle.
//!
//! This module ties the configuration, transport, poller, and sender
//! together and spawns the two long-running tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::config::{BridgeSettings, ChannelConfig, KeyValueStore};
use crate::error::{Error, Result};
use crate::poller::Poller;
use crate::sender::MessageSender;
use crate::transport::{HttpTransport, Transport};
use crate::types::{InboundMessage, OutboundMessage};

/// Handles to the two bridge tasks.
///
/// Dropping this detaches the tasks; they keep running.
#[derive(Debug)]
pub struct BridgeTasks {
    /// Receive loop.
    pub poll_task: JoinHandle<()>,
    /// Send loop.
    pub send_task: JoinHandle<()>,
}

impl BridgeTasks {
    /// Aborts both tasks.
    pub fn abort(&self) {
        self.poll_task.abort();
        self.send_task.abort();
    }
}

/// Bridge between the device's message queues and the bot API.
///
/// The handle is owned by the caller; several independent bridges can
/// coexist, each with its own transport and configuration.
pub struct Bridge<T> {
    transport: Arc<T>,
    config: Arc<ChannelConfig>,
    settings: Arc<BridgeSettings>,
}

impl Bridge<HttpTransport> {
    /// Creates a bridge over HTTPS, loading its configuration from `store`.
    #[must_use]
    pub fn from_store(store: &impl KeyValueStore, settings: BridgeSettings) -> Self {
        let config = ChannelConfig::load(store);
        tracing::info!("bridge initialized (configured={})", config.is_configured());
        Self::new(HttpTransport::new(), config, settings)
    }
}

impl<T: Transport + 'static> Bridge<T> {
    /// Creates a bridge with the given transport.
    #[must_use]
    pub fn new(transport: T, config: ChannelConfig, settings: BridgeSettings) -> Self {
        Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            settings: Arc::new(settings),
        }
    }

    /// Returns true once a credential is loaded.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Returns the provisioned peer id, or `0`.
    #[must_use]
    pub fn peer_id(&self) -> i64 {
        self.config.peer_id()
    }

    /// Returns the runtime settings.
    #[must_use]
    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Returns a sender for direct, unqueued delivery.
    #[must_use]
    pub fn sender(&self) -> MessageSender<T> {
        MessageSender::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
            Arc::clone(&self.settings),
        )
    }

    /// Delivers `text` immediately, bypassing the outbound queue.
    pub async fn send(&self, text: &str) -> Result<()> {
        self.sender().send(text).await
    }

    /// Sends the startup greeting.
    pub async fn send_startup(&self) -> Result<()> {
        self.sender().send_startup().await
    }

    /// Spawns the poll and send tasks.
    ///
    /// Accepted inbound messages are pushed to `inbound`; messages read from
    /// `outbound` are delivered in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQueue`] if either queue is already closed.
    pub fn start(
        &self,
        inbound: mpsc::Sender<InboundMessage>,
        outbound: mpsc::Receiver<OutboundMessage>,
    ) -> Result<BridgeTasks> {
        if inbound.is_closed() {
            tracing::error!("invalid inbound queue for bridge startup");
            return Err(Error::InvalidQueue { which: "inbound" });
        }
        if outbound.is_closed() {
            tracing::error!("invalid outbound queue for bridge startup");
            return Err(Error::InvalidQueue { which: "outbound" });
        }

        let poller = Poller::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
            Arc::clone(&self.settings),
            inbound,
        );
        let poll_task = tokio::spawn(poller.run().instrument(tracing::info_span!("tg_poll")));

        let sender = self.sender();
        let send_task =
            tokio::spawn(sender.run(outbound).instrument(tracing::info_span!("tg_send")));

        tracing::info!("bridge tasks started");
        Ok(BridgeTasks {
            poll_task,
            send_task,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{CREDENTIAL_KEY, Credential, MemoryStore, PEER_ID_KEY};
    use crate::transport::scripted::{Reply, ScriptedTransport};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    fn bridge(transport: &ScriptedTransport, peer_id: i64) -> Bridge<ScriptedTransport> {
        Bridge::new(
            transport.clone(),
            ChannelConfig::new(Credential::new("123:abc"), peer_id),
            BridgeSettings::default(),
        )
    }

    #[test]
    fn test_from_store() {
        let store = MemoryStore::new()
            .with(CREDENTIAL_KEY, "123:abc")
            .with(PEER_ID_KEY, " 77 ");
        let bridge = Bridge::from_store(&store, BridgeSettings::default());
        assert!(bridge.is_configured());
        assert_eq!(bridge.peer_id(), 77);

        let bridge = Bridge::from_store(&MemoryStore::new(), BridgeSettings::default());
        assert!(!bridge.is_configured());
        assert_eq!(bridge.peer_id(), 0);
    }

    #[tokio::test]
    async fn test_start_rejects_closed_queues() {
        let transport = ScriptedTransport::new([]);
        let bridge = bridge(&transport, 77);

        let (in_tx, in_rx) = mpsc::channel(4);
        let (_out_tx, out_rx) = mpsc::channel(4);
        drop(in_rx);
        assert!(matches!(
            bridge.start(in_tx, out_rx),
            Err(Error::InvalidQueue { which: "inbound" })
        ));

        let (in_tx, _in_rx) = mpsc::channel(4);
        let (out_tx, out_rx) = mpsc::channel::<OutboundMessage>(4);
        drop(out_tx);
        assert!(matches!(
            bridge.start(in_tx, out_rx),
            Err(Error::InvalidQueue { which: "outbound" })
        ));

        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_send_unconfigured_skips_network() {
        let transport = ScriptedTransport::new([]);
        let bridge = Bridge::new(
            transport.clone(),
            ChannelConfig::default(),
            BridgeSettings::default(),
        );

        assert!(matches!(bridge.send("x").await, Err(Error::NotConfigured)));
        assert!(matches!(
            bridge.send_startup().await,
            Err(Error::NotConfigured)
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_trip() {
        init_tracing();

        let transport = ScriptedTransport::new([
            // Flush: one stale command pending
            Reply::ok(r#"{"ok":true,"result":[{"update_id":41,"message":{"chat":{"id":77},"text":"reboot"}}]}"#),
            Reply::ok(r#"{"ok":true,"result":[]}"#),
            // First real poll
            Reply::ok(r#"{"ok":true,"result":[{"update_id":42,"message":{"chat":{"id":77},"text":"status"}}]}"#),
        ])
        .with_fallback(Reply::ok(r#"{"ok":true,"result":[]}"#));
        let bridge = bridge(&transport, 77);

        let (in_tx, mut in_rx) = mpsc::channel(4);
        let (out_tx, out_rx) = mpsc::channel(4);
        let tasks = bridge.start(in_tx, out_rx).unwrap();

        let message = in_rx.recv().await.unwrap();
        assert_eq!(message.text(), "status");

        out_tx.send(OutboundMessage::from("all good")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let requests = transport.requests();
        assert!(requests[2].url.contains("offset=42"));
        let sent: Vec<_> = requests
            .iter()
            .filter(|r| r.body.is_some())
            .map(|r| serde_json::from_slice::<serde_json::Value>(r.body.as_ref().unwrap()).unwrap())
            .collect();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["text"], "all good");
        assert_eq!(sent[0]["chat_id"], 77);

        tasks.abort();
    }
}
