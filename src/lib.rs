//! # botlink
//!
//! A long-polling bridge between an embedded device and a bot-style chat API.
//!
//! The bridge is the device's only channel to the wide-area network. It
//! receives operator commands from a single provisioned peer and delivers
//! the device's replies, surviving flaky networks, truncated responses, and
//! reboots without replaying stale commands.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Offset-based acknowledgment with a startup flush of stale commands
//! - Exponential backoff on failed polls
//! - Bounded response buffers with textual recovery of truncated bodies
//! - Fail-closed single-peer authentication
//!
//! ## Quick Start
//!
//! ```no_run
//! use botlink::{Bridge, BridgeSettings, MemoryStore, OutboundMessage};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), botlink::Error> {
//!     let store = MemoryStore::new()
//!         .with("tg_token", "123456:secret")
//!         .with("tg_chat_id", "987654321");
//!     let bridge = Bridge::from_store(&store, BridgeSettings::default());
//!
//!     let (inbound_tx, mut inbound_rx) = mpsc::channel(8);
//!     let (outbound_tx, outbound_rx) = mpsc::channel(8);
//!     let _tasks = bridge.start(inbound_tx, outbound_rx)?;
//!
//!     while let Some(command) = inbound_rx.recv().await {
//!         let reply = format!("got: {}", command.text());
//!         let _ = outbound_tx.send(OutboundMessage::from(reply)).await;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`protocol`] - Buffers, request builders, and response decoding
//! - [`transport`] - Transport trait and the HTTPS implementation
//! - [`config`] - Provisioned identity and runtime settings
//! - [`backoff`] - Retry policy and poll bookkeeping
//! - [`auth`] - Single-peer sender check
//! - [`poller`] - Long-poll receive loop and startup flush
//! - [`sender`] - Outbound delivery loop
//! - [`client`] - High-level [`Bridge`] handle

pub mod auth;
pub mod backoff;
pub mod client;
pub mod config;
pub mod error;
#[cfg(test)]
mod log_capture;
pub mod poller;
pub mod protocol;
pub mod sender;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use auth::{AuthDecision, authorize};
pub use backoff::{Backoff, PollPhase, PollState};
pub use client::{Bridge, BridgeTasks};
pub use config::{BridgeSettings, ChannelConfig, Credential, KeyValueStore, MemoryStore};
pub use error::{Error, Result};
pub use poller::{PollOutcome, Poller};
pub use protocol::{BoundedText, ResponseBuffer, extract_max_update_id};
pub use sender::{MessageSender, STARTUP_GREETING};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
pub use types::{InboundMessage, OutboundMessage};
